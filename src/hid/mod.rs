//! HID report types, the report descriptor, and the report store that
//! mediates access from the two transports.

pub mod keyboard;
pub mod report_map;
pub mod store;

pub use keyboard::{InputReport, INPUT_REPORT_SIZE, REPORT_DESCRIPTOR};
pub use store::{DeliveryPlan, ReportKind, ReportStore, FEATURE_REPORT_SIZE, OUTPUT_REPORT_SIZE};

//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - Device Information, Battery and HID-over-GATT
//!    services, declared in [`hog`].
//! 2. **Advertising loop** - advertises the HID and Battery services,
//!    accepts one connection at a time, and runs the GATT server on it
//!    until the host disconnects.
//! 3. **Input report notifications** - queued report bytes are pushed to
//!    the host with `notify_value` while a connection exists and the host
//!    has enabled notifications on the input report CCC.
//!
//! Writes from the host (output/feature reports, control point, CCC
//! changes) are forwarded into the [`crate::hid::store::ReportStore`],
//! which owns the canonical report bytes for both transports.

pub mod hog;

pub use hog::{queue_input_report, Server};

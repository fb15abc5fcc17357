//! USB Device subsystem - presents a HID keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. A single HID interface carries the same input report
//! bytes as the BLE transport, using the shared report descriptor.
//!
//! VBUS detection is software-driven: with the SoftDevice enabled it owns
//! the POWER peripheral, so USB attach/detach events arrive as SoC events
//! and are forwarded into `SoftwareVbusDetect` by the SoftDevice task.
//!
//! The writer task takes the freshest submitted input report and writes it
//! to the interrupt-IN endpoint; the report store's in-flight token
//! guarantees at most one submission is outstanding at a time.

pub mod hid_device;

pub use hid_device::{submit_input_report, UsbHid};

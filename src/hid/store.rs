//! HID report store - the canonical report bytes and their access rules.
//!
//! The store owns the input/output/feature report buffers and the control
//! point byte. Both transports (BLE HID-over-GATT and USB HID) and the
//! firmware's own key updates go through it; nothing else touches the
//! bytes. Report copies happen inside one short `critical_section` scope
//! each, so a reader can never observe a half-written report. The
//! transport readiness flags and the drop counter are lone atomics - no
//! lock is ever held across an await point.
//!
//! Input report delivery is an observer fan-out with per-transport gating:
//! `set_input_key` returns a [`DeliveryPlan`] naming the transports that
//! should carry the update. The BLE slot is filled only while the host has
//! notifications enabled on the input report CCC. The USB slot is filled
//! only if the single in-flight token was free; a held token means the
//! previous interrupt-IN write has not completed yet, and the update is
//! dropped in favour of whatever fresher state comes next.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::Mutex;

use crate::error::Error;
use crate::hid::keyboard::{InputReport, INPUT_REPORT_SIZE};

/// Output report capacity in bytes (LED state plus padding).
pub const OUTPUT_REPORT_SIZE: usize = 20;

/// Feature report size in bytes (vendor defined).
pub const FEATURE_REPORT_SIZE: usize = 2;

/// The three report types exchanged with the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Input,
    Output,
    Feature,
}

impl ReportKind {
    /// Fixed size of this report's backing buffer.
    pub const fn size(self) -> usize {
        match self {
            ReportKind::Input => INPUT_REPORT_SIZE,
            ReportKind::Output => OUTPUT_REPORT_SIZE,
            ReportKind::Feature => FEATURE_REPORT_SIZE,
        }
    }
}

/// Which transports should carry an input report update.
///
/// A `None` slot means that transport was not ready: BLE notifications
/// disabled, or the USB endpoint still busy with the previous write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub ble: Option<[u8; INPUT_REPORT_SIZE]>,
    pub usb: Option<[u8; INPUT_REPORT_SIZE]>,
}

struct Reports {
    input: InputReport,
    output: [u8; OUTPUT_REPORT_SIZE],
    feature: [u8; FEATURE_REPORT_SIZE],
    control_point: u8,
}

impl Reports {
    const fn new() -> Self {
        Self {
            input: InputReport::empty(),
            output: [0; OUTPUT_REPORT_SIZE],
            feature: [0; FEATURE_REPORT_SIZE],
            control_point: 0,
        }
    }
}

/// Canonical report state shared by both transports.
///
/// Constructed once as a `static`; the buffers live for the lifetime of
/// the firmware and are mutated in place.
pub struct ReportStore {
    reports: Mutex<RefCell<Reports>>,
    /// Input report CCC state: notifications enabled by the BLE host.
    notify_enabled: AtomicBool,
    /// Single-slot availability token for the USB interrupt-IN endpoint.
    usb_in_flight: AtomicBool,
    /// Input updates not handed to USB because the token was held.
    usb_dropped: AtomicU32,
}

impl ReportStore {
    pub const fn new() -> Self {
        Self {
            reports: Mutex::new(RefCell::new(Reports::new())),
            notify_enabled: AtomicBool::new(false),
            usb_in_flight: AtomicBool::new(false),
            usb_dropped: AtomicU32::new(0),
        }
    }

    /// Copy a snapshot of `kind`'s bytes starting at `offset` into `out`.
    ///
    /// Returns the number of bytes copied (`min(out.len(), size - offset)`,
    /// possibly 0). Fails with `InvalidOffset` when `offset` lies past the
    /// report's fixed size.
    pub fn read(&self, kind: ReportKind, offset: usize, out: &mut [u8]) -> Result<usize, Error> {
        let size = kind.size();
        if offset > size {
            return Err(Error::InvalidOffset);
        }
        let n = out.len().min(size - offset);

        critical_section::with(|cs| {
            let reports = self.reports.borrow_ref(cs);
            match kind {
                ReportKind::Input => {
                    let bytes = reports.input.to_bytes();
                    out[..n].copy_from_slice(&bytes[offset..offset + n]);
                }
                ReportKind::Output => out[..n].copy_from_slice(&reports.output[offset..offset + n]),
                ReportKind::Feature => {
                    out[..n].copy_from_slice(&reports.feature[offset..offset + n])
                }
            }
        });
        Ok(n)
    }

    /// Copy `data` into `kind`'s buffer at `offset`.
    ///
    /// The whole write must fit: `offset + data.len()` past the report's
    /// fixed size fails with `InvalidOffset` and leaves the buffer
    /// untouched. Returns the number of bytes written.
    pub fn write(&self, kind: ReportKind, offset: usize, data: &[u8]) -> Result<usize, Error> {
        let size = kind.size();
        if offset > size || data.len() > size - offset {
            return Err(Error::InvalidOffset);
        }

        critical_section::with(|cs| {
            let mut reports = self.reports.borrow_ref_mut(cs);
            match kind {
                ReportKind::Input => {
                    let mut bytes = reports.input.to_bytes();
                    bytes[offset..offset + data.len()].copy_from_slice(data);
                    // The full 8 bytes are always present, so this cannot fail.
                    if let Some(report) = InputReport::from_bytes(&bytes) {
                        reports.input = report;
                    }
                }
                ReportKind::Output => {
                    reports.output[offset..offset + data.len()].copy_from_slice(data)
                }
                ReportKind::Feature => {
                    reports.feature[offset..offset + data.len()].copy_from_slice(data)
                }
            }
        });
        Ok(data.len())
    }

    /// Update the input report's first key slot and plan the fan-out.
    ///
    /// `code == 0` is a key release. The returned plan carries the updated
    /// report bytes for each transport that is currently ready; acquiring
    /// the USB token is part of this call, so a `Some` USB slot obliges the
    /// caller to complete the write and release the token via
    /// [`usb_write_complete`](Self::usb_write_complete).
    pub fn set_input_key(&self, code: u8) -> DeliveryPlan {
        let bytes = critical_section::with(|cs| {
            let mut reports = self.reports.borrow_ref_mut(cs);
            reports.input.keycodes[0] = code;
            reports.input.to_bytes()
        });

        let ble = self.notify_enabled.load(Ordering::Acquire).then_some(bytes);

        let usb = if self
            .usb_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(bytes)
        } else {
            self.usb_dropped.fetch_add(1, Ordering::Relaxed);
            None
        };

        DeliveryPlan { ble, usb }
    }

    /// Record the input report CCC state written by the BLE host.
    pub fn set_notify_enabled(&self, enabled: bool) {
        self.notify_enabled.store(enabled, Ordering::Release);
    }

    /// Release the USB availability token.
    ///
    /// Must be called when an interrupt-IN write finishes, on the error
    /// path as much as on success - a token that is never returned keeps
    /// every later update off the USB transport.
    pub fn usb_write_complete(&self) {
        self.usb_in_flight.store(false, Ordering::Release);
    }

    /// Input updates dropped because the USB endpoint was busy.
    pub fn usb_dropped(&self) -> u32 {
        self.usb_dropped.load(Ordering::Relaxed)
    }

    /// Store a host write to the control point. No action is attached to
    /// the value; the hook exists because the characteristic does.
    pub fn set_control_point(&self, value: u8) {
        critical_section::with(|cs| {
            self.reports.borrow_ref_mut(cs).control_point = value;
        });
    }

    pub fn control_point(&self) -> u8 {
        critical_section::with(|cs| self.reports.borrow_ref(cs).control_point)
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

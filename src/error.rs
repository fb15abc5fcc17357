//! Unified error type for hogkbd.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A report read or write addressed bytes past the report's fixed size.
    /// Returned to the transport layer, which maps it to its own rejection
    /// code; the report bytes are left untouched.
    InvalidOffset,

    /// A subsystem could not be started (e.g. its executor task failed to
    /// spawn). Fatal to that subsystem only; the rest of the firmware keeps
    /// running without it.
    DeviceUnavailable,
}

//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Serial bridge

/// UART RX ring capacity in bytes. Power of two.
pub const UART_RX_RING_SIZE: usize = 256;

/// UART TX ring capacity in bytes. Power of two.
pub const UART_TX_RING_SIZE: usize = 256;

/// Largest chunk moved between the UART driver FIFO and a ring in one go.
pub const UART_CHUNK_SIZE: usize = 16;

/// Driver-internal RX/TX buffer size for the buffered UART.
pub const UART_DRIVER_BUF_SIZE: usize = 64;

// BLE

/// GAP device name, also carried in the advertising payload.
pub const DEVICE_NAME: &str = "hogkbd";

/// ATT MTU. The 8-byte input report fits the BLE 4.x default with room to
/// spare, so there is no need to negotiate a larger one.
pub const ATT_MTU: u16 = 23;

/// Advertising interval in 625 us units (100 ms).
pub const ADV_INTERVAL: u32 = 160;

/// Queued input reports awaiting a GATT notification. Oldest-first.
pub const BLE_INPUT_QUEUE_DEPTH: usize = 4;

/// Battery level reported at startup (percent).
pub const BATTERY_LEVEL_PERCENT: u8 = 50;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0001;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "hogkbd";
pub const USB_PRODUCT: &str = "HoG Keyboard";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms). 1 ms = 1000 Hz for lowest latency.
pub const USB_HID_POLL_MS: u8 = 1;

// Orchestration

/// Main-loop poll period for the UART echo path (ms).
pub const ECHO_POLL_MS: u64 = 1;

/// Pending key events between producers and the fan-out task.
pub const KEY_EVENT_QUEUE_DEPTH: usize = 8;

/// Period of the synthetic key generator (ms), `demo-keys` feature only.
pub const DEMO_KEY_PERIOD_MS: u64 = 1000;

/// Key code toggled by the synthetic key generator (HID usage 0x04 = 'a').
pub const DEMO_KEY_CODE: u8 = 0x04;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   UART TXD       → P0.06
//   UART RXD       → P0.08
//   Status LED 1   → P0.22
//   Status LED 2   → P0.23

//! USB HID keyboard device.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one HID interrupt-IN endpoint.

use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use crate::config;
use crate::hid::keyboard::{INPUT_REPORT_SIZE, REPORT_DESCRIPTOR};
use crate::hid::store::{ReportKind, ReportStore};

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, &'static SoftwareVbusDetect>;

static KB_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_REQUEST_HANDLER: StaticCell<KbdRequestHandler> = StaticCell::new();
static USB_DEVICE_HANDLER: StaticCell<DeviceStateHandler> = StaticCell::new();

/// Freshest input report awaiting the writer task. A new submission
/// replaces an unconsumed one, but the store's in-flight token means that
/// cannot happen while a write is outstanding.
static INPUT_REPORT: Signal<CriticalSectionRawMutex, [u8; INPUT_REPORT_SIZE]> = Signal::new();

/// Hand an input report to the USB transport. The caller must hold the
/// store's in-flight token (see `ReportStore::set_input_key`).
pub fn submit_input_report(report: [u8; INPUT_REPORT_SIZE]) {
    INPUT_REPORT.signal(report);
}

/// Handles HID class control requests on the control pipe.
struct KbdRequestHandler {
    store: &'static ReportStore,
}

impl RequestHandler for KbdRequestHandler {
    fn get_report(&mut self, id: ReportId, buf: &mut [u8]) -> Option<usize> {
        let kind = match id {
            ReportId::In(_) => ReportKind::Input,
            ReportId::Out(_) => ReportKind::Output,
            ReportId::Feature(_) => ReportKind::Feature,
        };
        self.store.read(kind, 0, buf).ok()
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        // Logged but deliberately not acted on.
        info!("usb: set_report {:?}, {} bytes", id, data.len());
        OutResponse::Accepted
    }
}

/// Logs USB device state transitions.
struct DeviceStateHandler;

impl embassy_usb::Handler for DeviceStateHandler {
    fn enabled(&mut self, enabled: bool) {
        info!("usb: {}", if enabled { "enabled" } else { "disabled" });
    }

    fn configured(&mut self, configured: bool) {
        info!("usb: configured: {}", configured);
    }

    fn suspended(&mut self, suspended: bool) {
        info!("usb: suspended: {}", suspended);
    }
}

/// Build result containing the USB device runner and the HID writer.
pub struct UsbHid {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: HidWriter<'static, UsbDriver, INPUT_REPORT_SIZE>,
}

/// Initialise the USB stack and create the HID keyboard device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(
    usbd: peripherals::USBD,
    vbus: &'static SoftwareVbusDetect,
    store: &'static ReportStore,
) -> UsbHid {
    let driver = Driver::new(usbd, Irqs, vbus);

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    builder.handler(USB_DEVICE_HANDLER.init(DeviceStateHandler));

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(USB_REQUEST_HANDLER.init(KbdRequestHandler { store })),
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: INPUT_REPORT_SIZE as u16,
    };
    let keyboard_writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let device = builder.build();

    info!("usb: HID keyboard device initialised");

    UsbHid {
        device,
        keyboard_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, and endpoint servicing.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("usb: device task started");
    device.run().await
}

/// Input report writer - one interrupt-IN write per submitted report.
///
/// The in-flight token is released on both the success and the error path;
/// a token that stays held would silently starve the USB transport.
pub async fn hid_writer_task(
    mut keyboard: HidWriter<'static, UsbDriver, INPUT_REPORT_SIZE>,
    store: &'static ReportStore,
) -> ! {
    info!("usb: HID writer task started");

    loop {
        let report = INPUT_REPORT.wait().await;
        if let Err(_e) = keyboard.write(&report).await {
            warn!("usb: keyboard write failed");
        }
        store.usb_write_complete();
    }
}

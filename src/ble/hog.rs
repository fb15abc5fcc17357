//! HID-over-GATT service table and connection loop.
//!
//! Three standard services are exposed:
//! - Device Information: PnP ID blob and manufacturer name.
//! - Battery: single-byte level, notifiable.
//! - HID: info blob, report map, input report (+ CCC + report reference),
//!   output report (+ reference), feature report (+ reference) and the
//!   write-only control point.
//!
//! The characteristic values served by the stack are initialised from the
//! same constants the report store uses, and every host write lands in the
//! store, so the two views cannot diverge.

use defmt::{error, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::gatt_server::{self, notify_value};
use nrf_softdevice::ble::{peripheral, Connection};
use nrf_softdevice::Softdevice;

use crate::config;
use crate::hid::keyboard::{INPUT_REPORT_SIZE, REPORT_DESCRIPTOR};
use crate::hid::store::{ReportKind, ReportStore, FEATURE_REPORT_SIZE, OUTPUT_REPORT_SIZE};

/// PnP ID blob: vendor ID source (USB), vendor ID, product ID, product
/// version, little-endian fields.
const PNP_ID: [u8; 7] = [0x02, 0x6d, 0x04, 0x5b, 0xb3, 0x11, 0x00];

const MANUFACTURER: &[u8] = b"hogkbd";

/// HID information: bcdHID 0x0101, country code 0, normally-connectable.
const HID_INFO: [u8; 4] = [0x01, 0x01, 0x00, 0x02];

const REPORT_MAP: &[u8] = REPORT_DESCRIPTOR;

// Report reference descriptors: report ID, report type (1 = input,
// 2 = output, 3 = feature).
const INPUT_REPORT_REF: [u8; 2] = [0x01, 0x01];
const OUTPUT_REPORT_REF: [u8; 2] = [0x02, 0x02];
const FEATURE_REPORT_REF: [u8; 2] = [0x03, 0x03];

const INPUT_REPORT_INIT: [u8; INPUT_REPORT_SIZE] = [0; INPUT_REPORT_SIZE];
const BATTERY_LEVEL_INIT: [u8; 1] = [config::BATTERY_LEVEL_PERCENT];
const NO_DATA: &[u8] = &[];

/// Output report LED bits, per the report descriptor.
const LED_NUM_LOCK: u8 = 0x01;
const LED_CAPS_LOCK: u8 = 0x02;

/// Input reports queued for notification, oldest first.
static INPUT_QUEUE: Channel<
    CriticalSectionRawMutex,
    [u8; INPUT_REPORT_SIZE],
    { config::BLE_INPUT_QUEUE_DEPTH },
> = Channel::new();

/// Hand an input report to the BLE transport. Returns `false` (and drops
/// the report) if the queue is full - the notification path is strictly
/// best-effort.
pub fn queue_input_report(report: [u8; INPUT_REPORT_SIZE]) -> bool {
    INPUT_QUEUE.try_send(report).is_ok()
}

#[nrf_softdevice::gatt_service(uuid = "180a")]
pub struct DeviceInformationService {
    #[characteristic(uuid = "2a50", read, initial_value = "PNP_ID")]
    pnp_id: [u8; 7],
    #[characteristic(uuid = "2a29", read, initial_value = "MANUFACTURER")]
    manufacturer_name: [u8; MANUFACTURER.len()],
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify, initial_value = "BATTERY_LEVEL_INIT")]
    battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1812")]
pub struct HidService {
    #[characteristic(uuid = "2a4a", read, initial_value = "HID_INFO")]
    hid_information: [u8; 4],
    #[characteristic(uuid = "2a4b", read, initial_value = "REPORT_MAP")]
    report_map: [u8; REPORT_MAP.len()],
    #[characteristic(
        uuid = "2a4d",
        read,
        notify,
        initial_value = "INPUT_REPORT_INIT",
        descriptor(uuid = "2908", value = "INPUT_REPORT_REF")
    )]
    input_report: [u8; INPUT_REPORT_SIZE],
    #[characteristic(
        uuid = "2a4d",
        read,
        write,
        write_without_response,
        initial_value = "NO_DATA",
        descriptor(uuid = "2908", value = "OUTPUT_REPORT_REF")
    )]
    output_report: Vec<u8, OUTPUT_REPORT_SIZE>,
    #[characteristic(
        uuid = "2a4d",
        read,
        write,
        initial_value = "NO_DATA",
        descriptor(uuid = "2908", value = "FEATURE_REPORT_REF")
    )]
    feature_report: Vec<u8, FEATURE_REPORT_SIZE>,
    #[characteristic(uuid = "2a4c", write_without_response)]
    control_point: u8,
}

impl HidService {
    fn handle(&self, event: HidServiceEvent, store: &ReportStore) {
        match event {
            HidServiceEvent::InputReportCccdWrite { notifications } => {
                info!("ble: input report notifications: {}", notifications);
                store.set_notify_enabled(notifications);
            }
            HidServiceEvent::OutputReportWrite(data) => {
                match store.write(ReportKind::Output, 0, &data) {
                    Ok(_) => log_led_state(&data),
                    Err(e) => warn!("ble: output report write rejected: {:?}", e),
                }
            }
            HidServiceEvent::FeatureReportWrite(data) => {
                if let Err(e) = store.write(ReportKind::Feature, 0, &data) {
                    warn!("ble: feature report write rejected: {:?}", e);
                }
            }
            HidServiceEvent::ControlPointWrite(value) => {
                // Stored but deliberately not acted on.
                info!("ble: control point write: {}", value);
                store.set_control_point(value);
            }
        }
    }
}

fn log_led_state(data: &[u8]) {
    let Some(&leds) = data.first() else {
        return;
    };
    info!(
        "ble: leds num={} caps={}",
        leds & LED_NUM_LOCK != 0,
        leds & LED_CAPS_LOCK != 0
    );
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub dis: DeviceInformationService,
    pub bas: BatteryService,
    pub hid: HidService,
}

impl Server {
    fn handle_event(&self, event: ServerEvent, store: &ReportStore) {
        match event {
            ServerEvent::Dis(_) => {}
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                info!("ble: battery notifications: {}", notifications);
            }
            ServerEvent::Hid(event) => self.hid.handle(event, store),
        }
    }
}

/// Advertise, serve one connection at a time, repeat.
pub async fn run(sd: &'static Softdevice, server: &'static Server, store: &'static ReportStore) -> ! {
    static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
        .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
        .services_16(
            ServiceList::Complete,
            &[
                ServiceUuid16::HUMAN_INTERFACE_DEVICE,
                ServiceUuid16::BATTERY,
            ],
        )
        .full_name(config::DEVICE_NAME)
        .build();

    static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new().build();

    loop {
        let adv_config = peripheral::Config {
            interval: config::ADV_INTERVAL,
            ..Default::default()
        };
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("ble: advertising failed: {:?}", e);
                continue;
            }
        };
        info!("ble: connected");

        // Reports queued while no host was listening are stale by now.
        while INPUT_QUEUE.try_receive().is_ok() {}

        let gatt_fut = gatt_server::run(&conn, server, |e| server.handle_event(e, store));
        let notify_fut = notify_input_reports(server, &conn);

        match select(gatt_fut, notify_fut).await {
            Either::First(e) => info!("ble: disconnected: {:?}", e),
            Either::Second(()) => {}
        }

        // CCC subscriptions do not outlive the connection.
        store.set_notify_enabled(false);
    }
}

/// Push queued input reports to the connected host.
async fn notify_input_reports(server: &Server, conn: &Connection) {
    loop {
        let report = INPUT_QUEUE.receive().await;
        if let Err(e) = notify_value(conn, server.hid.input_report_value_handle, &report) {
            error!("ble: notify failed: {:?}", e);
        }
    }
}

//! hogkbd - dual-transport HID keyboard firmware.
//!
//! Bring-up order: UART bridge, SoftDevice + GATT server, USB HID device,
//! status LEDs, then the fan-out and periodic tasks. The main task ends as
//! the polling loop that echoes UART RX bytes back out the TX path.

#![no_std]
#![no_main]

mod ble;
mod config;
mod error;
mod hid;
mod ring_buffer;
mod serial;
mod usb;

use defmt_rtt as _; // global logger
use panic_probe as _;

use core::mem;

use defmt::{error, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use embassy_usb::class::hid::HidWriter;
use embassy_usb::UsbDevice;
use nrf_softdevice::{raw, SocEvent, Softdevice};
use static_cell::StaticCell;

use crate::ble::hog;
use crate::hid::keyboard::INPUT_REPORT_SIZE;
use crate::hid::store::ReportStore;
use crate::usb::hid_device::UsbDriver;

/// Canonical HID report state, shared by both transports.
static STORE: ReportStore = ReportStore::new();

static SERVER: StaticCell<hog::Server> = StaticCell::new();
static VBUS_DETECT: StaticCell<SoftwareVbusDetect> = StaticCell::new();

/// Key codes from internal producers awaiting fan-out to the transports.
static KEY_EVENTS: Channel<CriticalSectionRawMutex, u8, { config::KEY_EVENT_QUEUE_DEPTH }> =
    Channel::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice, vbus: &'static SoftwareVbusDetect) -> ! {
    // The SoftDevice owns the POWER peripheral, so USB attach/detach
    // arrives as SoC events and is forwarded to the VBUS detector.
    sd.run_with_callback(|event| match event {
        SocEvent::PowerUsbDetected => vbus.detected(true),
        SocEvent::PowerUsbRemoved => vbus.detected(false),
        SocEvent::PowerUsbPowerReady => vbus.ready(),
        _ => {}
    })
    .await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    server: &'static hog::Server,
    store: &'static ReportStore,
) -> ! {
    hog::run(sd, server, store).await
}

#[embassy_executor::task]
async fn usb_device_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    usb::hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn usb_writer_task(
    writer: HidWriter<'static, UsbDriver, INPUT_REPORT_SIZE>,
    store: &'static ReportStore,
) -> ! {
    usb::hid_device::hid_writer_task(writer, store).await
}

/// Apply each key event to the store and deliver the update to whichever
/// transports the store says are ready.
#[embassy_executor::task]
async fn input_fanout_task(store: &'static ReportStore) -> ! {
    loop {
        let code = KEY_EVENTS.receive().await;
        let plan = store.set_input_key(code);
        if let Some(report) = plan.ble {
            if !ble::queue_input_report(report) {
                warn!("ble: input queue full, report dropped");
            }
        }
        if let Some(report) = plan.usb {
            usb::submit_input_report(report);
        }
    }
}

/// Periodic synthetic key generator: press, release, repeat.
#[cfg(feature = "demo-keys")]
#[embassy_executor::task]
async fn demo_keys_task() -> ! {
    let mut pressed = false;
    loop {
        Timer::after_millis(config::DEMO_KEY_PERIOD_MS).await;
        pressed = !pressed;
        let code = if pressed { config::DEMO_KEY_CODE } else { 0x00 };
        if KEY_EVENTS.try_send(code).is_err() {
            warn!("key event queue full");
        }
    }
}

fn initialize_sd() -> &'static mut Softdevice {
    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: config::ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    Softdevice::enable(&sd_config)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hogkbd starting");

    let mut nrf_config = embassy_nrf::config::Config::default();
    // The SoftDevice reserves the highest interrupt priorities.
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    interrupt::USBD.set_priority(Priority::P2);
    interrupt::UARTE0_UART0.set_priority(Priority::P3);

    // UART bridge. Losing it is not fatal: BLE and USB keep running.
    let mut bridge = match serial::init(
        &spawner, p.UARTE0, p.TIMER1, p.PPI_CH0, p.PPI_CH1, p.PPI_GROUP0, p.P0_08, p.P0_06,
    ) {
        Ok(bridge) => Some(bridge),
        Err(e) => {
            error!("serial: failed to start: {:?}", e);
            None
        }
    };

    // Bluetooth.
    let sd = initialize_sd();
    let server = SERVER.init(unwrap!(hog::Server::new(sd)));
    let vbus = VBUS_DETECT.init(SoftwareVbusDetect::new(true, true));
    unwrap!(spawner.spawn(softdevice_task(sd, vbus)));
    unwrap!(spawner.spawn(ble_task(sd, server, &STORE)));

    // USB. Also non-fatal on failure.
    let usb_hid = usb::hid_device::init(p.USBD, vbus, &STORE);
    if spawner.spawn(usb_device_task(usb_hid.device)).is_err()
        || spawner
            .spawn(usb_writer_task(usb_hid.keyboard_writer, &STORE))
            .is_err()
    {
        error!("usb: failed to start, continuing without USB");
    }

    // Status LEDs.
    let _led_power = Output::new(p.P0_22, Level::High, OutputDrive::Standard);
    let _led_status = Output::new(p.P0_23, Level::High, OutputDrive::Standard);

    unwrap!(spawner.spawn(input_fanout_task(&STORE)));
    #[cfg(feature = "demo-keys")]
    unwrap!(spawner.spawn(demo_keys_task()));

    // Echo loop: drain the RX ring back into the TX path.
    let mut buf = [0u8; config::UART_CHUNK_SIZE];
    loop {
        Timer::after_millis(config::ECHO_POLL_MS).await;
        let Some(bridge) = bridge.as_mut() else {
            continue;
        };
        if !bridge.rx_is_empty() {
            let n = bridge.recv(&mut buf);
            if n > 0 {
                bridge.send(&buf[..n]);
            }
        }
    }
}

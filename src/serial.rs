//! Serial bridge - interrupt-driven UART behind lock-free byte rings.
//!
//! Two SPSC rings decouple the hardware-driven side from the polling
//! thread:
//! - RX: the UART interrupt fills the driver FIFO; the drain task moves
//!   bytes into the RX ring as they arrive. The polling loop consumes them
//!   with `recv`/`rx_is_empty`. When the ring is full the remaining bytes
//!   of that chunk are dropped and the exact count is logged.
//! - TX: `send` producers fill the TX ring and raise the pending signal;
//!   the drain task empties the ring into the UART and parks on the signal
//!   once the ring runs dry, so an idle link costs nothing.
//!
//! There is no backpressure and no framing. Overflow in either direction
//! loses bytes and shows up only in the drop diagnostics - acceptable for
//! a best-effort echo/debug channel, not a reliable transport.

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_nrf::buffered_uarte::{self, BufferedUarte, BufferedUarteRx, BufferedUarteTx};
use embassy_nrf::peripherals::{P0_06, P0_08, PPI_CH0, PPI_CH1, PPI_GROUP0, TIMER1, UARTE0};
use embassy_nrf::{bind_interrupts, uarte};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use crate::config;
use crate::error::Error;
use crate::ring_buffer::{Consumer, Producer, RingBuffer};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => buffered_uarte::InterruptHandler<UARTE0>;
});

static RX_RING: StaticCell<RingBuffer<{ config::UART_RX_RING_SIZE }>> = StaticCell::new();
static TX_RING: StaticCell<RingBuffer<{ config::UART_TX_RING_SIZE }>> = StaticCell::new();
static RX_DRIVER_BUF: StaticCell<[u8; config::UART_DRIVER_BUF_SIZE]> = StaticCell::new();
static TX_DRIVER_BUF: StaticCell<[u8; config::UART_DRIVER_BUF_SIZE]> = StaticCell::new();

/// Raised by `send` when bytes are waiting; parks the TX drain task when
/// the ring is empty. The TX-interrupt enable/disable of a classic UART
/// driver, in signal form.
static TX_PENDING: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Thread-side handle: consumes received bytes, produces bytes to send.
pub struct SerialBridge {
    rx: Consumer<'static, { config::UART_RX_RING_SIZE }>,
    tx: Producer<'static, { config::UART_TX_RING_SIZE }>,
}

impl SerialBridge {
    /// Enqueue bytes for transmission and wake the TX drain task.
    ///
    /// Returns the count accepted; the shortfall on a full ring is dropped
    /// and logged, never blocked on.
    pub fn send(&mut self, data: &[u8]) -> usize {
        let accepted = self.tx.put(data);
        if accepted < data.len() {
            warn!("serial: dropped {} tx bytes", data.len() - accepted);
        }
        TX_PENDING.signal(());
        accepted
    }

    /// Pull received bytes out of the RX ring. Returns 0 when empty.
    pub fn recv(&mut self, out: &mut [u8]) -> usize {
        self.rx.get(out)
    }

    pub fn rx_is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Bring up the UART and the two drain tasks, returning the thread-side
/// bridge handle. Must be called exactly once.
#[allow(clippy::too_many_arguments)]
pub fn init(
    spawner: &Spawner,
    uarte: UARTE0,
    timer: TIMER1,
    ppi_ch1: PPI_CH0,
    ppi_ch2: PPI_CH1,
    ppi_group: PPI_GROUP0,
    rxd: P0_08,
    txd: P0_06,
) -> Result<SerialBridge, Error> {
    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;

    let uart = BufferedUarte::new(
        uarte,
        timer,
        ppi_ch1,
        ppi_ch2,
        ppi_group,
        Irqs,
        rxd,
        txd,
        uart_config,
        RX_DRIVER_BUF.init([0; config::UART_DRIVER_BUF_SIZE]),
        TX_DRIVER_BUF.init([0; config::UART_DRIVER_BUF_SIZE]),
    );
    let (uart_rx, uart_tx) = uart.split();

    let (rx_producer, rx_consumer) = RX_RING.init(RingBuffer::new()).split();
    let (tx_producer, tx_consumer) = TX_RING.init(RingBuffer::new()).split();

    spawner
        .spawn(rx_drain_task(uart_rx, rx_producer))
        .map_err(|_| Error::DeviceUnavailable)?;
    spawner
        .spawn(tx_drain_task(uart_tx, tx_consumer))
        .map_err(|_| Error::DeviceUnavailable)?;

    info!(
        "serial: bridge up, rings rx={} tx={} bytes",
        config::UART_RX_RING_SIZE,
        config::UART_TX_RING_SIZE
    );

    Ok(SerialBridge {
        rx: rx_consumer,
        tx: tx_producer,
    })
}

/// Move bytes from the driver FIFO into the RX ring as they arrive.
#[embassy_executor::task]
async fn rx_drain_task(
    mut uart: BufferedUarteRx<'static, UARTE0, TIMER1>,
    mut ring: Producer<'static, { config::UART_RX_RING_SIZE }>,
) -> ! {
    let mut chunk = [0u8; config::UART_CHUNK_SIZE];
    loop {
        match uart.read(&mut chunk).await {
            Ok(0) => {}
            Ok(n) => {
                let accepted = ring.put(&chunk[..n]);
                if accepted < n {
                    warn!("serial: dropped {} rx bytes", n - accepted);
                }
            }
            Err(e) => {
                warn!("serial: uart read error: {:?}", e);
                Timer::after_millis(10).await;
            }
        }
    }
}

/// Empty the TX ring into the UART; park on the pending signal when dry.
#[embassy_executor::task]
async fn tx_drain_task(
    mut uart: BufferedUarteTx<'static, UARTE0>,
    mut ring: Consumer<'static, { config::UART_TX_RING_SIZE }>,
) -> ! {
    let mut chunk = [0u8; config::UART_CHUNK_SIZE];
    loop {
        let n = ring.get(&mut chunk);
        if n == 0 {
            TX_PENDING.wait().await;
            continue;
        }
        if uart.write_all(&chunk[..n]).await.is_err() {
            warn!("serial: dropped {} tx bytes", n);
        }
        let _ = uart.flush().await;
    }
}

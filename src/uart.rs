//! UART link to the LoRa-E5 module.
//!
//! Two tasks own the UARTE halves and talk to the polling loop through
//! bounded channels:
//!
//! - `rx_task` only moves received bytes into [`RX_BYTES`]; framing is
//!   done by the core radio session on the polling side.
//! - `tx_task` writes each queued command line followed by CR LF.
//!
//! The polling loop never awaits either channel.

use defmt::warn;
use embassy_nrf::peripherals::{TIMER0, UARTE0};
use embassy_nrf::uarte::{UarteRxWithIdle, UarteTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use lorapager::at::Command;
use lorapager::config::COMMAND_MAX_LEN;
use lorapager::{CommandSink, Error};

/// Received bytes not yet seen by the polling loop.
const RX_QUEUE_LEN: usize = 256;

/// Command lines waiting for the UART.
const TX_QUEUE_LEN: usize = 4;

pub static RX_BYTES: Channel<CriticalSectionRawMutex, u8, RX_QUEUE_LEN> = Channel::new();
pub static TX_LINES: Channel<CriticalSectionRawMutex, Command, TX_QUEUE_LEN> = Channel::new();

#[embassy_executor::task]
pub async fn rx_task(mut rx: UarteRxWithIdle<'static, UARTE0, TIMER0>) -> ! {
    let mut buf = [0u8; 64];
    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(n) => {
                for &b in &buf[..n] {
                    if RX_BYTES.try_send(b).is_err() {
                        warn!("uart: rx queue full, dropping bytes");
                        break;
                    }
                }
            }
            Err(e) => warn!("uart: rx error {:?}", e),
        }
    }
}

#[embassy_executor::task]
pub async fn tx_task(mut tx: UarteTx<'static, UARTE0>) -> ! {
    // EasyDMA reads from RAM only.
    let mut out = [0u8; COMMAND_MAX_LEN + 2];
    loop {
        let line = TX_LINES.receive().await;
        let len = line.len();
        out[..len].copy_from_slice(line.as_bytes());
        out[len..len + 2].copy_from_slice(b"\r\n");
        if let Err(e) = tx.write(&out[..len + 2]).await {
            warn!("uart: tx error {:?}", e);
        }
    }
}

/// Bytes received since the last call.
pub fn drain_rx() -> impl Iterator<Item = u8> {
    core::iter::from_fn(|| RX_BYTES.try_receive().ok())
}

/// Throw away pending input (module boot chatter, command echoes).
pub fn discard_rx() {
    while RX_BYTES.try_receive().is_ok() {}
}

/// [`CommandSink`] feeding `tx_task`.
pub struct ChannelSink;

impl CommandSink for ChannelSink {
    fn send(&mut self, command: &str) -> Result<(), Error> {
        let mut line = Command::new();
        line.push_str(command).map_err(|_| Error::BufferOverflow)?;
        TX_LINES.try_send(line).map_err(|_| Error::Serial)
    }
}

//! Radio session: silence-framed reception and the transmit state machine.
//!
//! The LoRa module answers with loosely timed text lines and no reliable
//! terminator, so a frame is whatever arrived before the line went quiet
//! for `rx_silence_ms`. Each complete frame is classified as a received
//! packet, a transmit completion, or noise.
//!
//! ```text
//! Listening --request_send--> TransmitPending --TX DONE / timeout--> TransmitSettling
//!     ^                                                                    |
//!     +---------------------- settle delay, re-enter RX -------------------+
//! ```
//!
//! The session is the only writer of the command channel; a send while a
//! transmission is in flight is rejected, never queued.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::at::{self, Command, SetupStep};
use crate::codec::{self, Sender};
use crate::config::{Profile, COMMAND_MAX_LEN, INITIAL_RSSI, RX_BUFFER_MAX, SENDER_PLACEHOLDER};
use crate::Error;

/// Outbound command channel to the radio module.
pub trait CommandSink {
    /// Queue one command line (without terminator).
    fn send(&mut self, command: &str) -> Result<(), Error>;
}

/// Where the transmit/receive state machine stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Receive mode; ready to send.
    Listening,
    /// Transmit command issued at `since`, waiting for `TX DONE`.
    TransmitPending { since: u64 },
    /// Transmission over at `since`; waiting out the settle delay.
    TransmitSettling { since: u64 },
}

/// A received packet that carried a payload. `sender` is the sender
/// shown after it: the one it named, else the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderUpdate {
    pub sender: Sender,
    pub rssi: i16,
}

/// A frame as text; bytes above 0x7F take two bytes each.
const FRAME_TEXT_MAX: usize = RX_BUFFER_MAX * 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SessionTiming {
    rx_silence_ms: u64,
    tx_done_timeout_ms: u64,
    settle_ms: u64,
    sender_stale_ms: u64,
}

pub struct RadioSession<S: CommandSink> {
    sink: S,
    timing: SessionTiming,
    rx_capacity: usize,
    hex_payload: bool,

    frame: Vec<u8, RX_BUFFER_MAX>,
    receiving: bool,
    last_byte_at: u64,

    state: SessionState,
    tx_count: u32,
    rx_count: u32,
    rssi: i16,
    last_rx_at: u64,
    sender: Option<Sender>,
}

impl<S: CommandSink> RadioSession<S> {
    /// New session; `now` counts as the last reception for staleness.
    pub fn new(sink: S, profile: &Profile, now: u64) -> Self {
        let t = &profile.timing;
        Self {
            sink,
            timing: SessionTiming {
                rx_silence_ms: t.rx_silence_ms,
                tx_done_timeout_ms: t.tx_done_timeout_ms,
                settle_ms: t.settle_ms,
                sender_stale_ms: t.sender_stale_ms,
            },
            rx_capacity: profile.rx_capacity.min(RX_BUFFER_MAX),
            hex_payload: profile.hex_payload,
            frame: Vec::new(),
            receiving: false,
            last_byte_at: now,
            state: SessionState::Listening,
            tx_count: 0,
            rx_count: 0,
            rssi: INITIAL_RSSI,
            last_rx_at: now,
            sender: None,
        }
    }

    /// Send one bring-up command; returns how long to wait before the next.
    pub fn setup(&mut self, step: &SetupStep) -> u64 {
        self.issue(&step.command);
        step.wait_ms
    }

    /// Put the module in receive mode and start listening.
    pub fn listen(&mut self, now: u64) {
        self.issue(&at::receive());
        self.frame.clear();
        self.receiving = false;
        self.last_rx_at = now;
        self.state = SessionState::Listening;
        info!("radio: listening");
    }

    /// Transmit `<name>-<sequence>`. Rejected with [`Error::Busy`] unless
    /// the session is listening.
    pub fn request_send(&mut self, name: &str, now: u64) -> Result<(), Error> {
        if self.state != SessionState::Listening {
            debug!("radio: send rejected, busy");
            return Err(Error::Busy);
        }

        let mut text: String<COMMAND_MAX_LEN> = String::new();
        write!(text, "{}-{}", name.trim_end_matches(' '), self.tx_count)
            .map_err(|_| Error::BufferOverflow)?;
        let command = if self.hex_payload {
            let hex: String<COMMAND_MAX_LEN> = codec::encode_hex(&text)?;
            at::transmit(&hex)?
        } else {
            at::transmit(&text)?
        };

        self.sink.send(&command)?;
        self.tx_count += 1;
        self.state = SessionState::TransmitPending { since: now };
        info!("radio: tx #{} started", self.tx_count);
        Ok(())
    }

    /// Feed the bytes that arrived since the last tick and run every
    /// time-based transition. Returns an update for a packet with a
    /// payload completed on this tick.
    pub fn poll<I>(&mut self, now: u64, bytes: I) -> Option<SenderUpdate>
    where
        I: IntoIterator<Item = u8>,
    {
        for b in bytes {
            if self.frame.len() < self.rx_capacity {
                // Capacity is checked above.
                let _ = self.frame.push(b);
            }
            self.last_byte_at = now;
            self.receiving = true;
        }

        let mut update = None;
        if self.receiving && now.saturating_sub(self.last_byte_at) >= self.timing.rx_silence_ms {
            self.receiving = false;
            update = self.on_frame_complete(now);
        }

        self.advance(now);
        self.expire_sender(now);
        update
    }

    fn on_frame_complete(&mut self, now: u64) -> Option<SenderUpdate> {
        let frame = core::mem::take(&mut self.frame);
        // Bytes map one-to-one onto chars so line noise never hides a marker.
        let mut chars: String<FRAME_TEXT_MAX> = String::new();
        for &b in &frame {
            let _ = chars.push(char::from(b));
        }
        let text = chars.as_str();

        if at::is_packet(text) {
            return self.on_packet(text, now);
        }

        if matches!(self.state, SessionState::TransmitPending { .. }) && at::is_tx_done(text) {
            info!("radio: tx done");
            self.state = SessionState::TransmitSettling { since: now };
        } else {
            debug!("radio: discarded {} byte frame", frame.len());
        }
        None
    }

    fn on_packet(&mut self, text: &str, now: u64) -> Option<SenderUpdate> {
        self.rx_count += 1;
        self.last_rx_at = now;
        if let Some(rssi) = at::parse_rssi(text) {
            self.rssi = rssi;
        }

        let payload = at::quoted_payload(text);
        if let Some(sender) = payload.as_deref().and_then(codec::sender_from_payload) {
            self.sender = Some(sender);
        }
        info!("radio: rx #{} rssi {}", self.rx_count, self.rssi);

        self.issue(&at::receive());
        payload.map(|_| {
            let mut sender = Sender::new();
            codec::push_truncated(&mut sender, self.sender());
            SenderUpdate {
                sender,
                rssi: self.rssi,
            }
        })
    }

    fn advance(&mut self, now: u64) {
        match self.state {
            SessionState::TransmitPending { since }
                if now.saturating_sub(since) >= self.timing.tx_done_timeout_ms =>
            {
                warn!("radio: no TX DONE, assuming sent");
                self.state = SessionState::TransmitSettling { since: now };
            }
            SessionState::TransmitSettling { since }
                if now.saturating_sub(since) >= self.timing.settle_ms =>
            {
                self.issue(&at::receive());
                self.state = SessionState::Listening;
                debug!("radio: settled, listening");
            }
            _ => {}
        }
    }

    fn expire_sender(&mut self, now: u64) {
        if self.sender.is_some()
            && now.saturating_sub(self.last_rx_at) >= self.timing.sender_stale_ms
        {
            self.sender = None;
        }
    }

    fn issue(&mut self, command: &Command) {
        if self.sink.send(command).is_err() {
            warn!("radio: command dropped");
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    /// Last sender, or the placeholder once it has gone stale.
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or(SENDER_PLACEHOLDER)
    }

    pub fn rx_count(&self) -> u32 {
        self.rx_count
    }

    pub fn tx_count(&self) -> u32 {
        self.tx_count
    }

    pub fn rssi(&self) -> i16 {
        self.rssi
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

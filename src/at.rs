//! LoRa-E5 AT command strings and notification parsing.
//!
//! The module runs in "test" (raw LoRa) mode. Commands are single ASCII
//! lines; the line terminator is appended by the UART writer.
//!
//! Notifications of interest:
//! ```text
//! +TEST: LEN:5, RSSI:-87, SNR:9
//! +TEST: RX "626F622D37"
//! +TEST: TX DONE
//! ```

use core::fmt::Write as _;

use heapless::String;

use crate::codec::Payload;
use crate::config::{RfConfig, COMMAND_MAX_LEN, PAYLOAD_MAX_LEN};
use crate::Error;

/// One outgoing command line.
pub type Command = String<COMMAND_MAX_LEN>;

pub const CMD_MODE_TEST: &str = "AT+MODE=TEST";
pub const CMD_RECEIVE: &str = "AT+TEST=RXLRPKT";

/// Substrings marking a received packet (either form counts).
pub const MARKER_RX_PAYLOAD: &str = "RX \"";
pub const MARKER_RSSI: &str = "RSSI";
/// Key immediately preceding the RSSI value.
pub const RSSI_KEY: &str = "RSSI:";
/// Substring marking the end of a transmission.
pub const MARKER_TX_DONE: &str = "TX DONE";

fn command(text: &str) -> Command {
    let mut cmd = Command::new();
    crate::codec::push_truncated(&mut cmd, text);
    cmd
}

/// `AT+MODE=TEST`
pub fn mode_test() -> Command {
    command(CMD_MODE_TEST)
}

/// `AT+TEST=RXLRPKT`
pub fn receive() -> Command {
    command(CMD_RECEIVE)
}

/// `AT+TEST=RFCFG,<freq>,SF<sf>,<bw>,<preamble>,<txpreamble>,<power>,ON,OFF,OFF`
pub fn rf_config(rf: &RfConfig) -> Command {
    let mut cmd = Command::new();
    // Worst case is well under COMMAND_MAX_LEN.
    let _ = write!(
        cmd,
        "AT+TEST=RFCFG,{},SF{},{},{},{},{},ON,OFF,OFF",
        rf.freq_mhz, rf.spreading_factor, rf.bandwidth_khz, rf.preamble, rf.tx_preamble, rf.power_dbm
    );
    cmd
}

/// `AT+TEST=TXLRSTR,"<payload>"`
pub fn transmit(payload: &str) -> Result<Command, Error> {
    let mut cmd = Command::new();
    write!(cmd, "AT+TEST=TXLRSTR,\"{}\"", payload).map_err(|_| Error::BufferOverflow)?;
    Ok(cmd)
}

/// One step of the module bring-up sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupStep {
    pub command: Command,
    /// Wait this long after sending.
    pub wait_ms: u64,
    /// Throw away whatever the module echoed once the wait is over.
    pub drain_after: bool,
}

/// Commands issued once at boot, before the session starts listening.
pub fn setup_sequence(rf: &RfConfig) -> [SetupStep; 2] {
    [
        SetupStep {
            command: mode_test(),
            wait_ms: 1000,
            drain_after: false,
        },
        SetupStep {
            command: rf_config(rf),
            wait_ms: 500,
            drain_after: true,
        },
    ]
}

/// True when the frame reports a received packet.
pub fn is_packet(frame: &str) -> bool {
    frame.contains(MARKER_RX_PAYLOAD) || frame.contains(MARKER_RSSI)
}

pub fn is_tx_done(frame: &str) -> bool {
    frame.contains(MARKER_TX_DONE)
}

/// Signed decimal after `RSSI:`, `atoi` style: leading whitespace and
/// one sign allowed, parsing stops at the first non-digit. `None` if the
/// key is missing or no digit follows.
pub fn parse_rssi(frame: &str) -> Option<i16> {
    let start = frame.find(RSSI_KEY)? + RSSI_KEY.len();
    let rest = frame[start..].trim_start();

    let (negative, digits) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let mut value: i32 = 0;
    let mut any = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i32::from(b - b'0')).min(i32::from(i16::MAX) + 1);
        any = true;
    }
    if !any {
        return None;
    }

    let value = if negative { -value } else { value };
    Some(value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
}

/// Text between the first pair of double quotes, truncated to
/// [`PAYLOAD_MAX_LEN`]. `None` when unquoted or empty.
pub fn quoted_payload(frame: &str) -> Option<Payload> {
    let open = frame.find('"')? + 1;
    let len = frame[open..].find('"')?;
    if len == 0 {
        return None;
    }

    let mut payload = Payload::new();
    for c in frame[open..open + len].chars() {
        if payload.len() + c.len_utf8() > PAYLOAD_MAX_LEN || payload.push(c).is_err() {
            break;
        }
    }
    Some(payload)
}

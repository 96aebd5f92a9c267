//! Payload decoding: optional hex unwrap and sender extraction.
//!
//! Senders either put their text straight into the LoRa payload or
//! hex-escape it; a receiver accepts both without any signalling.
//! Decoding is best-effort and never fails the caller.

use heapless::String;

use crate::config::{NAME_MAX_LEN, PAYLOAD_MAX_LEN};

/// Decoded payload text.
pub type Payload = String<PAYLOAD_MAX_LEN>;

/// Sender identity taken from a payload.
pub type Sender = String<NAME_MAX_LEN>;

/// Separator between the sender identity and the rest of the payload.
pub const SENDER_SEPARATOR: char = '-';

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(10 + b - b'a'),
        b'A'..=b'F' => Some(10 + b - b'A'),
        _ => None,
    }
}

/// True when `raw` is a non-empty, even-length run of hex digits.
pub fn is_hex_payload(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes.iter().all(u8::is_ascii_hexdigit)
}

/// Unwrap a hex-encoded payload, or copy it through unchanged.
///
/// Decoded bytes are taken as Latin-1, one `char` per byte. Output that
/// does not fit is truncated.
pub fn decode(raw: &str) -> Payload {
    let mut out = Payload::new();

    if is_hex_payload(raw) {
        for pair in raw.as_bytes().chunks_exact(2) {
            let (Some(hi), Some(lo)) = (hex_value(pair[0]), hex_value(pair[1])) else {
                break;
            };
            if out.push(((hi << 4) | lo) as char).is_err() {
                break;
            }
        }
        return out;
    }

    push_truncated(&mut out, raw);
    out
}

/// Hex-encode `text` (lowercase digits).
pub fn encode_hex<const N: usize>(text: &str) -> Result<String<N>, crate::Error> {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::new();
    for b in text.bytes() {
        out.push(DIGITS[(b >> 4) as usize] as char)
            .and_then(|_| out.push(DIGITS[(b & 0x0F) as usize] as char))
            .map_err(|_| crate::Error::BufferOverflow)?;
    }
    Ok(out)
}

/// Everything before the last separator, or the whole text, truncated to
/// the identity length. `None` when that leaves nothing.
pub fn extract_sender(decoded: &str) -> Option<Sender> {
    let head = match decoded.rfind(SENDER_SEPARATOR) {
        Some(end) => &decoded[..end],
        None => decoded,
    };
    if head.is_empty() {
        return None;
    }

    let mut sender = Sender::new();
    push_truncated(&mut sender, head);
    Some(sender)
}

/// Decode `raw` and pull out its sender identity.
pub fn sender_from_payload(raw: &str) -> Option<Sender> {
    extract_sender(&decode(raw))
}

/// Append as much of `text` as fits, stopping on a character boundary.
pub fn push_truncated<const N: usize>(out: &mut String<N>, text: &str) {
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_payload_is_unwrapped() {
        // "bob-7"
        assert_eq!(decode("626f622d37").as_str(), "bob-7");
        assert_eq!(decode("414243").as_str(), "ABC");
        assert_eq!(decode("4A4b").as_str(), "JK");
    }

    #[test]
    fn non_hex_payload_passes_through() {
        assert_eq!(decode("alice-42").as_str(), "alice-42");
        // Odd length is never hex.
        assert_eq!(decode("abc").as_str(), "abc");
        // Single hex digit pair minimum.
        assert_eq!(decode("a").as_str(), "a");
        assert_eq!(decode("").as_str(), "");
        assert_eq!(decode("12zz").as_str(), "12zz");
    }

    #[test]
    fn hex_round_trip() {
        for text in ["alice-42", "x", "hello world-1"] {
            let hex: String<64> = encode_hex(text).unwrap();
            assert!(is_hex_payload(&hex));
            assert_eq!(decode(&hex).as_str(), text);
        }
    }

    #[test]
    fn encode_hex_reports_overflow() {
        let res: Result<String<4>, _> = encode_hex("abc");
        assert_eq!(res, Err(crate::Error::BufferOverflow));
    }

    #[test]
    fn long_hex_payload_truncates() {
        let raw: String<96> = encode_hex("abcdefghijklmnopqrstuvwxyz0123456789").unwrap();
        let out = decode(&raw);
        assert_eq!(out.len(), PAYLOAD_MAX_LEN);
        assert!(out.starts_with("abcdefghijklmnopqrstuvwxyz012345"));
    }

    #[test]
    fn sender_is_text_before_last_separator() {
        assert_eq!(extract_sender("alice-42").unwrap().as_str(), "alice");
        assert_eq!(extract_sender("mary-jane-3").unwrap().as_str(), "mary-jane");
        assert_eq!(extract_sender("noseparator").unwrap().as_str(), "noseparator");
    }

    #[test]
    fn empty_sender_is_rejected() {
        assert!(extract_sender("").is_none());
        assert!(extract_sender("-42").is_none());
    }

    #[test]
    fn sender_is_truncated_to_name_length() {
        let sender = extract_sender("abcdefghijklmnopqrstu-1").unwrap();
        assert_eq!(sender.as_str(), "abcdefghijklmnop");
    }

    #[test]
    fn sender_from_hex_payload() {
        let hex: String<32> = encode_hex("carol-9").unwrap();
        assert_eq!(sender_from_payload(&hex).unwrap().as_str(), "carol");
    }
}

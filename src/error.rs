//! Unified error type for lorapager.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
///
/// None of these are fatal: the polling loop logs them and carries on
/// from a previously defined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Radio
    /// A transmission is already in flight; retry once the session is
    /// listening again.
    Busy,

    /// The outbound command channel to the radio module is full or the
    /// UART write failed.
    Serial,

    // Storage
    /// Non-volatile read/write failed.
    Storage,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::Busy => "transmit in progress",
            Error::Serial => "radio serial failure",
            Error::Storage => "storage failure",
            Error::Display => "display failure",
            Error::BufferOverflow => "buffer overflow",
        };
        f.write_str(msg)
    }
}

//! Application-wide constants and startup configuration.
//!
//! Pin assignments, storage layout and protocol constants live here as
//! plain constants. Everything that differed between device builds
//! (buffer size, silence gap, display cadence) is gathered in a
//! [`Profile`] value chosen once at startup.

// Identity

/// Maximum length of the user identity (and of a display line).
pub const NAME_MAX_LEN: usize = 16;

/// Identity used when storage is unset or holds nothing printable.
pub const DEFAULT_NAME: &str = "add name";

/// Shown in place of the last sender once it has gone stale.
pub const SENDER_PLACEHOLDER: &str = "Waiting";

/// Characters a name may contain, in editing order.
pub const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz ";

/// Byte offset of the identity record inside the non-volatile image.
pub const NAME_STORAGE_ADDR: usize = 0;

// Display

/// Number of text rows on the display.
pub const DISPLAY_LINES: usize = 4;

/// Characters per row.
pub const LINE_WIDTH: usize = 16;

// Radio

/// Hard upper bound for a received frame; `Profile::rx_capacity` may be
/// smaller.
pub const RX_BUFFER_MAX: usize = 128;

/// Longest quoted payload taken from a receive notification.
pub const PAYLOAD_MAX_LEN: usize = 32;

/// Longest outgoing AT command line.
pub const COMMAND_MAX_LEN: usize = 96;

/// RSSI reported before any packet has been heard (dBm).
pub const INITIAL_RSSI: i16 = -120;

/// LoRa-E5 UART baud rate.
pub const RADIO_BAUD: u32 = 9600;

/// Delay before talking to the radio module after power-up (ms).
pub const RADIO_BOOT_DELAY_MS: u64 = 2000;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button 1       → P0.11
//   Button 2       → P0.12
//   Button 3       → P0.24
//   Button 4       → P0.25
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   Radio UART RX  → P1.01
//   Radio UART TX  → P1.02

/// Number of push-buttons on the 4-button build.
pub const BUTTON_COUNT: usize = 4;

// Identity storage

/// Flash page index where identity storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 254;

/// Number of flash pages reserved for identity storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;

/// Size of the in-RAM byte image mirrored to flash.
pub const STORAGE_IMAGE_SIZE: usize = 32;

/// Time budgets, all in milliseconds of the monotonic clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Raw level must hold this long before the debounced state flips.
    pub debounce_ms: u64,
    /// Shortest press that produces a Short event.
    pub min_press_ms: u64,
    /// Hold time that produces a Long event.
    pub long_press_ms: u64,
    /// Inter-byte gap that closes a received frame.
    pub rx_silence_ms: u64,
    /// Give up waiting for `TX DONE` after this long.
    pub tx_done_timeout_ms: u64,
    /// Pause after a transmit before re-entering receive mode.
    pub settle_ms: u64,
    /// Last sender reverts to the placeholder after this long.
    pub sender_stale_ms: u64,
    /// Display refresh cadence.
    pub display_interval_ms: u64,
    /// Half period of the naming cursor blink.
    pub cursor_blink_ms: u64,
    /// How long the "From:" banner stays up after a reception.
    pub rx_banner_ms: u64,
}

impl TimingConfig {
    pub const DEFAULT: Self = Self {
        debounce_ms: 5,
        min_press_ms: 5,
        long_press_ms: 2000,
        rx_silence_ms: 100,
        tx_done_timeout_ms: 1500,
        settle_ms: 200,
        sender_stale_ms: 2000,
        display_interval_ms: 75,
        cursor_blink_ms: 300,
        rx_banner_ms: 1000,
    };
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fixed RF parameters handed to the module with `AT+TEST=RFCFG`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RfConfig {
    pub freq_mhz: u16,
    pub spreading_factor: u8,
    pub bandwidth_khz: u16,
    pub preamble: u16,
    pub tx_preamble: u16,
    pub power_dbm: i8,
}

impl RfConfig {
    pub const US915: Self = Self {
        freq_mhz: 915,
        spreading_factor: 12,
        bandwidth_khz: 125,
        preamble: 15,
        tx_preamble: 15,
        power_dbm: 22,
    };
}

impl Default for RfConfig {
    fn default() -> Self {
        Self::US915
    }
}

/// Per-build parameters, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    pub timing: TimingConfig,
    pub rf: RfConfig,
    /// Frame buffer limit, clamped to [`RX_BUFFER_MAX`].
    pub rx_capacity: usize,
    /// Send payloads hex-encoded instead of as plain text.
    pub hex_payload: bool,
}

impl Profile {
    /// Small-RAM build with a software UART: short buffer, slower cadence.
    pub const COMPACT: Self = Self {
        timing: TimingConfig {
            rx_silence_ms: 200,
            display_interval_ms: 150,
            ..TimingConfig::DEFAULT
        },
        rf: RfConfig::US915,
        rx_capacity: 48,
        hex_payload: false,
    };

    /// Hardware UART build.
    pub const STANDARD: Self = Self {
        timing: TimingConfig::DEFAULT,
        rf: RfConfig::US915,
        rx_capacity: RX_BUFFER_MAX,
        hex_payload: false,
    };
}

impl Default for Profile {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Which button does what. Indices beyond the fitted button count are
/// simply never pressed, so a 1-button build only ever sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Keymap {
    /// Short press in main mode transmits the identity.
    pub send: usize,
    /// Long press toggles naming mode (enter / commit).
    pub naming: usize,
    /// Long press in naming mode blanks the buffer.
    pub clear: usize,
    /// Long press in naming mode leaves without saving.
    pub cancel: usize,
    pub char_next: usize,
    pub char_prev: usize,
    pub cursor_next: usize,
    pub cursor_prev: usize,
}

impl Keymap {
    pub const FOUR_BUTTON: Self = Self {
        send: 0,
        naming: 3,
        clear: 2,
        cancel: 0,
        char_next: 1,
        char_prev: 0,
        cursor_next: 3,
        cursor_prev: 2,
    };
}

impl Default for Keymap {
    fn default() -> Self {
        Self::FOUR_BUTTON
    }
}

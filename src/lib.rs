//! Host-testable core of the lorapager firmware.
//!
//! Everything here is hardware-free: the radio, display, buttons and
//! storage are reached through small traits ([`radio::CommandSink`],
//! [`presenter::LineDisplay`], [`identity::NvStore`]) and raw levels, so
//! the whole polling loop runs under `cargo test --lib`.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! It only provides the peripheral glue and the boot sequence.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Core modules
// ═══════════════════════════════════════════════════════════════════════════

pub mod at;
pub mod codec;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod identity;
pub mod input;
pub mod presenter;
pub mod radio;

pub use controller::{Controller, Mode};
pub use error::Error;
pub use identity::{ByteImage, Identity, IdentityStore, NvStore};
pub use input::{ButtonEvent, Level, Press};
pub use presenter::{LineDisplay, Presenter};
pub use radio::{CommandSink, RadioSession, SenderUpdate, SessionState};

//! GPIO button sampling.
//!
//! Four tactile switches, active-low with internal pull-up. The pins are
//! read once per loop tick; debouncing and press classification happen
//! in the core ([`lorapager::input`]), never here.

use embassy_nrf::gpio::{AnyPin, Input, Pull};
use lorapager::Level;

pub struct ButtonPins<'d, const N: usize> {
    pins: [Input<'d>; N],
}

impl<'d, const N: usize> ButtonPins<'d, N> {
    pub fn new(pins: [AnyPin; N]) -> Self {
        Self {
            pins: pins.map(|pin| Input::new(pin, Pull::Up)),
        }
    }

    /// Current raw level of every button.
    pub fn levels(&self) -> [Level; N] {
        core::array::from_fn(|i| Level::from_high(self.pins[i].is_high()))
    }
}

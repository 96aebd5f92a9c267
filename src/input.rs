//! Button debouncing and press classification.
//!
//! Buttons are active-low with a pull-up, so `Level::Low` means pressed.
//! Each button gets its own [`Debouncer`], sampled once per loop tick:
//!
//! - a raw level change re-anchors the debounce window;
//! - the debounced state flips only once the raw level has held for
//!   `debounce_ms` and differs from the current state;
//! - release after at least `min_press_ms` gives [`Press::Short`];
//! - holding for `long_press_ms` gives [`Press::Long`] while still held.
//!
//! Short and Long are mutually exclusive within one low phase.

use crate::config::TimingConfig;

/// Electrical level of a button input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Level from an `is_high()` style reading.
    pub fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A classified press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Short,
    Long,
}

/// A press tied to the button that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub button: usize,
    pub press: Press,
}

/// Debounce thresholds, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceTiming {
    pub debounce_ms: u64,
    pub min_press_ms: u64,
    pub long_press_ms: u64,
}

impl From<&TimingConfig> for DebounceTiming {
    fn from(t: &TimingConfig) -> Self {
        Self {
            debounce_ms: t.debounce_ms,
            min_press_ms: t.min_press_ms,
            long_press_ms: t.long_press_ms,
        }
    }
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::DEFAULT)
    }
}

/// Per-button debounce state.
#[derive(Clone, Debug)]
pub struct Debouncer {
    timing: DebounceTiming,
    last_raw: Level,
    changed_at: u64,
    state: Level,
    low_since: u64,
    seen_low: bool,
    long_fired: bool,
}

impl Debouncer {
    /// A released (pulled-up) button.
    pub fn new(timing: DebounceTiming) -> Self {
        Self {
            timing,
            last_raw: Level::High,
            changed_at: 0,
            state: Level::High,
            low_since: 0,
            seen_low: false,
            long_fired: false,
        }
    }

    /// Debounced level.
    pub fn state(&self) -> Level {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        self.state == Level::Low
    }

    /// Feed one raw reading taken at `now` (ms).
    pub fn sample(&mut self, raw: Level, now: u64) -> Option<Press> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.changed_at = now;
        }

        if now.saturating_sub(self.changed_at) >= self.timing.debounce_ms && raw != self.state {
            self.state = raw;
            match raw {
                Level::Low => {
                    self.seen_low = true;
                    self.low_since = now;
                    self.long_fired = false;
                }
                Level::High => return self.release(now),
            }
        }

        if self.state == Level::Low && self.seen_low && !self.long_fired {
            if now.saturating_sub(self.low_since) >= self.timing.long_press_ms {
                self.long_fired = true;
                return Some(Press::Long);
            }
        }

        None
    }

    fn release(&mut self, now: u64) -> Option<Press> {
        let seen_low = core::mem::replace(&mut self.seen_low, false);
        if !seen_low || self.long_fired {
            return None;
        }

        let held = now.saturating_sub(self.low_since);
        if held >= self.timing.long_press_ms {
            // Threshold reached on the same tick as the release.
            self.long_fired = true;
            Some(Press::Long)
        } else if held >= self.timing.min_press_ms {
            Some(Press::Short)
        } else {
            None
        }
    }
}

/// Presses collected from one tick, indexed by button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickEvents<const N: usize>([Option<Press>; N]);

impl<const N: usize> TickEvents<N> {
    pub const fn none() -> Self {
        Self([None; N])
    }

    pub fn get(&self, button: usize) -> Option<Press> {
        self.0.get(button).copied().flatten()
    }

    pub fn short(&self, button: usize) -> bool {
        self.get(button) == Some(Press::Short)
    }

    pub fn long(&self, button: usize) -> bool {
        self.get(button) == Some(Press::Long)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = ButtonEvent> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(button, press)| press.map(|press| ButtonEvent { button, press }))
    }
}

/// One debouncer per fitted button.
#[derive(Clone, Debug)]
pub struct ButtonBank<const N: usize> {
    channels: [Debouncer; N],
}

impl<const N: usize> ButtonBank<N> {
    pub fn new(timing: DebounceTiming) -> Self {
        Self {
            channels: core::array::from_fn(|_| Debouncer::new(timing)),
        }
    }

    /// Sample every button once.
    pub fn sample(&mut self, levels: [Level; N], now: u64) -> TickEvents<N> {
        let mut events = [None; N];
        for (i, (channel, raw)) in self.channels.iter_mut().zip(levels).enumerate() {
            events[i] = channel.sample(raw, now);
            if let Some(press) = events[i] {
                debug!("button {}: {}", i + 1, press);
            }
        }
        TickEvents(events)
    }
}

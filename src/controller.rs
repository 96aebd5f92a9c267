//! Top-level polling loop body.
//!
//! One [`Controller::tick`] per loop iteration, always in this order:
//!
//! 1. sample every button;
//! 2. dispatch presses to the main screen or the name editor;
//! 3. feed received bytes to the radio session and run its timers;
//! 4. redraw changed display rows, at most once per refresh interval.
//!
//! Every wait is a timestamp comparison; nothing in here blocks.

use core::fmt::Write as _;

use heapless::String;

use crate::config::{Keymap, Profile, DISPLAY_LINES};
use crate::editor::NameEditor;
use crate::identity::{Identity, IdentityStore, NvStore};
use crate::input::{ButtonBank, DebounceTiming, Level, TickEvents};
use crate::presenter::{line, Line, LineDisplay, Presenter};
use crate::radio::{CommandSink, RadioSession};
use crate::Error;

/// What the buttons currently drive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Identity on screen; a short press sends it.
    Main,
    /// Editing the identity.
    Naming(NameEditor),
}

pub struct Controller<S: CommandSink, N: NvStore, const B: usize> {
    profile: Profile,
    keymap: Keymap,
    buttons: ButtonBank<B>,
    radio: RadioSession<S>,
    identities: IdentityStore<N>,
    identity: Identity,
    mode: Mode,
    presenter: Presenter,
    last_render: Option<u64>,
    /// "From:" banner and the time it comes down.
    banner: Option<(Line, u64)>,
}

impl<S: CommandSink, N: NvStore, const B: usize> Controller<S, N, B> {
    /// Load the identity and set up every component. The radio is not
    /// told anything yet; run the setup sequence through [`Self::radio_mut`].
    pub fn new(profile: Profile, keymap: Keymap, sink: S, storage: N, now: u64) -> Self {
        let mut identities = IdentityStore::new(storage);
        let identity = identities.load();
        info!("controller: identity {}", identity);

        Self {
            profile,
            keymap,
            buttons: ButtonBank::new(DebounceTiming::from(&profile.timing)),
            radio: RadioSession::new(sink, &profile, now),
            identities,
            identity,
            mode: Mode::Main,
            presenter: Presenter::new(),
            last_render: None,
            banner: None,
        }
    }

    /// Run one loop iteration.
    pub fn tick<I, D>(&mut self, now: u64, levels: [Level; B], rx: I, display: &mut D) -> TickEvents<B>
    where
        I: IntoIterator<Item = u8>,
        D: LineDisplay,
    {
        let events = self.buttons.sample(levels, now);
        self.dispatch(&events, now);

        if let Some(update) = self.radio.poll(now, rx) {
            let mut banner: String<32> = String::new();
            let _ = write!(banner, "From:{}", update.sender.as_str());
            self.banner = Some((line(&banner), now + self.profile.timing.rx_banner_ms));
        }

        let due = match self.last_render {
            None => true,
            Some(at) => now.saturating_sub(at) >= self.profile.timing.display_interval_ms,
        };
        if due {
            self.last_render = Some(now);
            if let Err(e) = self.render(display, now) {
                warn!("display: {}", e);
            }
        }

        events
    }

    fn dispatch(&mut self, events: &TickEvents<B>, now: u64) {
        if events.is_empty() {
            return;
        }
        let k = self.keymap;

        if self.mode == Mode::Main {
            if events.short(k.send) {
                match self.radio.request_send(self.identity.as_str(), now) {
                    Ok(()) | Err(Error::Busy) => {}
                    Err(e) => warn!("send failed: {}", e),
                }
            }
            if events.long(k.naming) {
                info!("naming: enter");
                self.mode = Mode::Naming(NameEditor::new(&self.identity));
            }
            return;
        }

        if events.long(k.naming) {
            self.leave_naming(true);
            return;
        }
        if events.long(k.cancel) {
            self.leave_naming(false);
            return;
        }

        if let Mode::Naming(editor) = &mut self.mode {
            if events.long(k.clear) {
                editor.clear();
            }
            if events.short(k.char_next) {
                editor.next_char();
            }
            if events.short(k.char_prev) {
                editor.prev_char();
            }
            if events.short(k.cursor_next) {
                editor.cursor_right();
            }
            if events.short(k.cursor_prev) {
                editor.cursor_left();
            }
        }
    }

    fn leave_naming(&mut self, save: bool) {
        let Mode::Naming(editor) = core::mem::replace(&mut self.mode, Mode::Main) else {
            return;
        };
        if !save {
            info!("naming: cancelled");
            return;
        }
        match editor.commit(&mut self.identities) {
            Ok(identity) => self.identity = identity,
            Err(e) => error!("naming: save failed: {}", e),
        }
    }

    fn render<D: LineDisplay>(&mut self, display: &mut D, now: u64) -> Result<usize, Error> {
        let lines = self.compose(now);
        let rows: [&str; DISPLAY_LINES] = core::array::from_fn(|i| lines[i].as_str());
        self.presenter.render(display, &rows)
    }

    /// Text for each display row at `now`.
    pub fn compose(&self, now: u64) -> [Line; DISPLAY_LINES] {
        let mut lines: [Line; DISPLAY_LINES] = Default::default();

        match &self.mode {
            Mode::Main => {
                lines[0] = line(self.identity.as_str());
                lines[1] = line(self.radio.sender());
                if let Some((banner, until)) = &self.banner {
                    if now < *until {
                        lines[2] = banner.clone();
                    }
                }
                lines[3] = self.status_line();
            }
            Mode::Naming(editor) => {
                let half = self.profile.timing.cursor_blink_ms.max(1);
                let blink_on = (now / half) % 2 == 0;
                lines[0] = line(editor.text());
                lines[1] = editor.cursor_line(blink_on);
            }
        }
        lines
    }

    fn status_line(&self) -> Line {
        let mut status: String<32> = String::new();
        if !self.radio.is_listening() {
            let _ = status.push_str("TX...");
        } else if self.radio.rx_count() > 0 {
            let _ = write!(status, "RX {} {}dBm", self.radio.rx_count(), self.radio.rssi());
        }
        line(&status)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn radio(&self) -> &RadioSession<S> {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut RadioSession<S> {
        &mut self.radio
    }

    /// The identity storage, e.g. to persist it once dirty.
    pub fn storage_mut(&mut self) -> &mut N {
        self.identities.storage_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ByteImage;
    use crate::input::Level::{High, Low};

    #[derive(Default)]
    struct NullSink(usize);

    impl CommandSink for NullSink {
        fn send(&mut self, _command: &str) -> Result<(), Error> {
            self.0 += 1;
            Ok(())
        }
    }

    struct NullDisplay;

    impl LineDisplay for NullDisplay {
        fn set_line(&mut self, _row: u8) -> Result<(), Error> {
            Ok(())
        }
        fn write_text(&mut self, _text: &str) -> Result<(), Error> {
            Ok(())
        }
        fn clear_to_eol(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    type TestController = Controller<NullSink, ByteImage<32>, 4>;

    fn controller(name: &[u8]) -> TestController {
        Controller::new(
            Profile::STANDARD,
            Keymap::FOUR_BUTTON,
            NullSink::default(),
            ByteImage::from_bytes(name),
            0,
        )
    }

    /// Hold `button` low for `ms` starting at `*now`, then release and let
    /// it settle, advancing `*now`.
    fn press(c: &mut TestController, now: &mut u64, button: usize, ms: u64) {
        let mut levels = [High; 4];
        levels[button] = Low;
        let end = *now + ms;
        while *now < end {
            c.tick(*now, levels, core::iter::empty(), &mut NullDisplay);
            *now += 1;
        }
        let settle = *now + 20;
        while *now < settle {
            c.tick(*now, [High; 4], core::iter::empty(), &mut NullDisplay);
            *now += 1;
        }
    }

    #[test]
    fn loads_identity_at_startup() {
        let c = controller(b"zed\0");
        assert_eq!(c.identity().as_str(), "zed");
        assert_eq!(c.compose(0)[0].as_str(), "zed");
        assert_eq!(c.compose(0)[1].as_str(), "Waiting");
    }

    #[test]
    fn long_press_enters_naming_and_commit_saves() {
        let mut c = controller(b"zed\0");
        let mut now = 0;
        press(&mut c, &mut now, 3, 2100);
        assert!(matches!(c.mode(), Mode::Naming(_)));

        press(&mut c, &mut now, 1, 50); // z -> ' '
        press(&mut c, &mut now, 1, 50); // ' ' -> a
        press(&mut c, &mut now, 3, 2100);
        assert_eq!(c.mode(), &Mode::Main);
        assert_eq!(c.identity().as_str(), "aed");
        assert!(c.storage_mut().is_dirty());
    }

    #[test]
    fn cancel_discards_edits() {
        let mut c = controller(b"zed\0");
        let mut now = 0;
        press(&mut c, &mut now, 3, 2100);
        press(&mut c, &mut now, 2, 2100); // clear
        press(&mut c, &mut now, 0, 2100); // cancel
        assert_eq!(c.mode(), &Mode::Main);
        assert_eq!(c.identity().as_str(), "zed");
        assert!(!c.storage_mut().is_dirty());
    }

    #[test]
    fn naming_screen_blinks_cursor() {
        let mut c = controller(b"zed\0");
        let mut now = 0;
        press(&mut c, &mut now, 3, 2100);
        let on = (now / 600) * 600;
        assert_eq!(c.compose(on)[0].as_str(), "zed             ");
        assert_eq!(c.compose(on)[1].as_str(), "^               ");
        assert_eq!(c.compose(on + 300)[1].as_str(), "                ");
    }

    #[test]
    fn short_press_sends_in_main_mode() {
        let mut c = controller(b"zed\0");
        let mut now = 0;
        press(&mut c, &mut now, 0, 50);
        assert_eq!(c.radio().tx_count(), 1);
        assert_eq!(c.compose(now)[3].as_str(), "TX...");
    }
}

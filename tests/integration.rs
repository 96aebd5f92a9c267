//! Integration tests for the lorapager polling loop, driven through the
//! public controller API with fake buttons, radio and display.

use lorapager::config::{Keymap, Profile};
use lorapager::{
    ByteImage, CommandSink, Controller, Error, Level, LineDisplay, Mode, SessionState,
};

#[derive(Default)]
struct Commands(Vec<String>);

impl CommandSink for Commands {
    fn send(&mut self, command: &str) -> Result<(), Error> {
        self.0.push(command.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Screen {
    row: usize,
    rows: [String; 4],
    writes: usize,
}

impl LineDisplay for Screen {
    fn set_line(&mut self, row: u8) -> Result<(), Error> {
        self.row = usize::from(row);
        self.rows[self.row].clear();
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), Error> {
        self.rows[self.row].push_str(text);
        self.writes += 1;
        Ok(())
    }

    fn clear_to_eol(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

type Pager = Controller<Commands, ByteImage<32>, 4>;

const UP: [Level; 4] = [Level::High; 4];

struct Bench {
    pager: Pager,
    screen: Screen,
    now: u64,
}

impl Bench {
    fn new(image: ByteImage<32>) -> Self {
        let mut pager = Controller::new(
            Profile::STANDARD,
            Keymap::FOUR_BUTTON,
            Commands::default(),
            image,
            0,
        );
        pager.radio_mut().listen(0);
        Self {
            pager,
            screen: Screen::default(),
            now: 0,
        }
    }

    fn named(name: &[u8]) -> Self {
        Self::new(ByteImage::from_bytes(name))
    }

    fn tick_with(&mut self, levels: [Level; 4], rx: &[u8]) {
        self.pager
            .tick(self.now, levels, rx.iter().copied(), &mut self.screen);
        self.now += 1;
    }

    fn idle(&mut self, ms: u64) {
        for _ in 0..ms {
            self.tick_with(UP, &[]);
        }
    }

    fn press(&mut self, button: usize, ms: u64) {
        let mut levels = UP;
        levels[button] = Level::Low;
        for _ in 0..ms {
            self.tick_with(levels, &[]);
        }
        self.idle(20);
    }

    fn receive(&mut self, frame: &str) {
        self.tick_with(UP, frame.as_bytes());
    }

    fn commands(&self) -> &[String] {
        &self.pager.radio().sink().0
    }
}

#[test]
fn short_press_transmits_name_and_sequence() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(0, 50);

    assert_eq!(bench.pager.radio().tx_count(), 1);
    assert_eq!(
        bench.commands().last().map(String::as_str),
        Some("AT+TEST=TXLRSTR,\"zed-0\"")
    );
    assert!(matches!(
        bench.pager.radio().state(),
        SessionState::TransmitPending { .. }
    ));
}

#[test]
fn send_while_transmitting_is_dropped() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(0, 50);
    bench.press(0, 50);

    assert_eq!(bench.pager.radio().tx_count(), 1);
    let transmits = bench
        .commands()
        .iter()
        .filter(|c| c.starts_with("AT+TEST=TXLRSTR"))
        .count();
    assert_eq!(transmits, 1);
}

#[test]
fn tx_done_settles_back_to_receive() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(0, 50);
    let sent = bench.commands().len();

    bench.receive("+TEST: TX DONE\r\n");
    bench.idle(100);
    assert!(matches!(
        bench.pager.radio().state(),
        SessionState::TransmitSettling { .. }
    ));

    bench.idle(200);
    assert!(bench.pager.radio().is_listening());
    assert_eq!(bench.commands().len(), sent + 1);
    assert_eq!(bench.commands()[sent], "AT+TEST=RXLRPKT");

    bench.press(0, 50);
    assert_eq!(
        bench.commands().last().map(String::as_str),
        Some("AT+TEST=TXLRSTR,\"zed-1\"")
    );
}

#[test]
fn missing_tx_done_recovers_after_timeout_and_settle() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(0, 50);
    let SessionState::TransmitPending { since } = bench.pager.radio().state() else {
        panic!("expected a pending transmission");
    };

    while bench.now < since + 1700 {
        bench.idle(1);
        assert!(!bench.pager.radio().is_listening());
    }
    bench.idle(1);
    assert!(bench.pager.radio().is_listening());
    assert_eq!(bench.commands().last().map(String::as_str), Some("AT+TEST=RXLRPKT"));
}

#[test]
fn received_packet_shows_sender_banner_and_status() {
    let mut bench = Bench::named(b"zed\0");
    bench.idle(10);
    let before = bench.commands().len();

    bench.receive("+TEST: LEN:5, RSSI:-45, SNR:9\r\n+TEST: RX \"bob-3\"\r\n");
    bench.idle(100);
    let done = bench.now;

    let lines = bench.pager.compose(done);
    assert_eq!(lines[0].as_str(), "zed");
    assert_eq!(lines[1].as_str(), "bob");
    assert_eq!(lines[2].as_str(), "From:bob");
    assert_eq!(lines[3].as_str(), "RX 1 -45dBm");

    // Receive mode is re-armed after every packet.
    assert_eq!(bench.commands().len(), before + 1);
    assert_eq!(bench.commands()[before], "AT+TEST=RXLRPKT");

    bench.idle(1000);
    assert_eq!(bench.pager.compose(bench.now)[2].as_str(), "");
    assert_eq!(bench.pager.compose(bench.now)[1].as_str(), "bob");

    bench.idle(1000);
    assert_eq!(bench.pager.compose(bench.now)[1].as_str(), "Waiting");
}

#[test]
fn packet_is_handled_while_transmit_pending() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(0, 50);

    bench.receive("+TEST: RX \"amy-7\"\r\n");
    bench.idle(100);

    assert_eq!(bench.pager.radio().rx_count(), 1);
    assert_eq!(bench.pager.radio().sender(), "amy");
    assert!(matches!(
        bench.pager.radio().state(),
        SessionState::TransmitPending { .. }
    ));
}

#[test]
fn renamed_identity_survives_restart() {
    let mut bench = Bench::named(b"zed\0");
    bench.press(3, 2100);
    assert!(matches!(bench.pager.mode(), Mode::Naming(_)));

    // Clear, then type "b" in the first slot.
    bench.press(2, 2100);
    bench.press(1, 50); // ' ' -> a
    bench.press(1, 50); // a -> b
    bench.press(3, 2100);
    assert_eq!(bench.pager.mode(), &Mode::Main);
    assert_eq!(bench.pager.identity().as_str(), "b");

    let image = ByteImage::<32>::from_bytes(bench.pager.storage_mut().as_bytes());
    let rebooted = Bench::new(image);
    assert_eq!(rebooted.pager.identity().as_str(), "b");
}

#[test]
fn blank_storage_uses_default_name() {
    let mut bench = Bench::new(ByteImage::erased());
    bench.idle(1);
    assert_eq!(bench.screen.rows[0], "add name");
    assert_eq!(bench.screen.rows[1], "Waiting");
}

#[test]
fn unchanged_rows_are_not_redrawn() {
    let mut bench = Bench::named(b"zed\0");
    bench.idle(1);
    let first = bench.screen.writes;
    assert_eq!(first, 4);

    bench.idle(500);
    assert_eq!(bench.screen.writes, first);

    bench.receive("+TEST: LEN:5, RSSI:-80, SNR:2\r\n+TEST: RX \"bob-1\"\r\n");
    bench.idle(200);
    // Sender, banner and status rows change; the identity row does not.
    assert_eq!(bench.screen.writes, first + 3);
    assert_eq!(bench.screen.rows[0], "zed");
    assert_eq!(bench.screen.rows[2], "From:bob");
}

#[test]
fn single_button_build_only_sends() {
    let mut pager: Controller<Commands, ByteImage<32>, 1> = Controller::new(
        Profile::COMPACT,
        Keymap::FOUR_BUTTON,
        Commands::default(),
        ByteImage::from_bytes(b"solo\0"),
        0,
    );
    pager.radio_mut().listen(0);
    let mut screen = Screen::default();

    for now in 0..2100 {
        pager.tick(now, [Level::Low], core::iter::empty(), &mut screen);
    }
    for now in 2100..2200 {
        pager.tick(now, [Level::High], core::iter::empty(), &mut screen);
    }
    assert_eq!(pager.mode(), &Mode::Main);
    assert_eq!(pager.radio().tx_count(), 0);

    for now in 2200..2300 {
        let level = if now < 2250 { Level::Low } else { Level::High };
        pager.tick(now, [level], core::iter::empty(), &mut screen);
    }
    assert_eq!(pager.radio().tx_count(), 1);
    assert_eq!(
        pager.radio().sink().0.last().map(String::as_str),
        Some("AT+TEST=TXLRSTR,\"solo-0\"")
    );
}

#[test]
fn banner_shows_previous_sender_for_unnamed_packet() {
    let mut bench = Bench::named(b"zed\0");
    bench.receive("+TEST: RX \"bob-1\"\r\n");
    bench.idle(1200);
    assert_eq!(bench.pager.compose(bench.now)[2].as_str(), "");

    bench.receive("+TEST: RX \"-7\"\r\n");
    bench.idle(100);
    let lines = bench.pager.compose(bench.now);
    assert_eq!(lines[1].as_str(), "bob");
    assert_eq!(lines[2].as_str(), "From:bob");
}

//! lorapager firmware entry point (nRF52840).
//!
//! Boot: load the identity from flash, bring up the OLED, buttons and
//! the radio UART, run the LoRa-E5 setup sequence, then hand over to
//! the core controller's polling loop for good.

#![no_std]
#![no_main]

mod storage;
mod uart;
mod ui;

use defmt::{info, unwrap};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::Pin as _;
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::{bind_interrupts, peripherals, twim, uarte};
use embassy_time::{Duration, Instant, Ticker, Timer};
use lorapager::config::{Keymap, Profile, BUTTON_COUNT, RADIO_BOOT_DELAY_MS};
use lorapager::{at, Controller};
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UARTE0 => uarte::InterruptHandler<peripherals::UARTE0>;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Hardware UART build.
const PROFILE: Profile = Profile::STANDARD;

/// Polling loop period (ms).
const TICK_MS: u64 = 1;

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("lorapager starting");

    // - Identity storage ----------------------------------
    let mut flash = BlockingAsync::new(Nvmc::new(p.NVMC));
    let image = storage::load_image(&mut flash).await;

    // - Display ---------------------------------------
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut lines = ui::display::OledLines::new(ui::display::init(i2c));

    // - Buttons ---------------------------------------
    let buttons = ui::buttons::ButtonPins::new([
        p.P0_11.degrade(),
        p.P0_12.degrade(),
        p.P0_24.degrade(),
        p.P0_25.degrade(),
    ]);

    // - Radio UART -------------------------------------
    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD9600;
    let uart = uarte::Uarte::new(p.UARTE0, Irqs, p.P1_01, p.P1_02, uart_config);
    let (tx, rx) = uart.split_with_idle(p.TIMER0, p.PPI_CH0, p.PPI_CH1);
    unwrap!(spawner.spawn(uart::rx_task(rx)));
    unwrap!(spawner.spawn(uart::tx_task(tx)));

    let mut controller: Controller<uart::ChannelSink, storage::IdentityImage, BUTTON_COUNT> =
        Controller::new(PROFILE, Keymap::FOUR_BUTTON, uart::ChannelSink, image, now_ms());

    // Identity on screen while the module boots.
    controller.tick(now_ms(), buttons.levels(), core::iter::empty(), &mut lines);

    // - Radio setup ------------------------------------
    Timer::after_millis(RADIO_BOOT_DELAY_MS).await;
    uart::discard_rx();
    for step in at::setup_sequence(&PROFILE.rf) {
        let wait = controller.radio_mut().setup(&step);
        Timer::after_millis(wait).await;
        if step.drain_after {
            uart::discard_rx();
        }
    }
    controller.radio_mut().listen(now_ms());
    info!("radio ready");

    // - Polling loop -----------------------------------
    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS));
    loop {
        controller.tick(now_ms(), buttons.levels(), uart::drain_rx(), &mut lines);

        if controller.storage_mut().is_dirty() {
            storage::save_image(&mut flash, controller.storage_mut()).await;
        }

        ticker.next().await;
    }
}

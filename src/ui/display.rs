//! SSD1306 OLED display wrapper.
//!
//! Presents the 128×64 panel as four rows of sixteen 8×13 characters
//! (one row per 16 px band) behind the core's [`LineDisplay`] trait.
//! Drawing goes to the frame buffer; [`LineDisplay::flush`] pushes it.

use defmt::warn;
use embedded_graphics::mono_font::ascii::FONT_8X13;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use lorapager::{Error, LineDisplay};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const PANEL_WIDTH: u32 = 128;
const CHAR_WIDTH: u32 = 8;
const ROW_HEIGHT: u32 = 16;

/// Initialise the SSD1306 display and clear the screen.
///
/// A missing panel is logged, not fatal: the radio keeps working and
/// every later flush just fails.
pub fn init<I2C>(i2c: I2C) -> Display<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    if display.init().is_err() {
        warn!("display: init failed");
    }
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_8X13)
        .text_color(BinaryColor::On)
        .background_color(BinaryColor::Off)
        .build()
}

/// Character-row view of the panel.
pub struct OledLines<I2C> {
    display: Display<I2C>,
    row: u8,
    col: u32,
}

impl<I2C> OledLines<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    pub fn new(display: Display<I2C>) -> Self {
        Self {
            display,
            row: 0,
            col: 0,
        }
    }

    fn cursor(&self) -> Point {
        Point::new((self.col * CHAR_WIDTH) as i32, (u32::from(self.row) * ROW_HEIGHT) as i32)
    }
}

impl<I2C> LineDisplay for OledLines<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn set_line(&mut self, row: u8) -> Result<(), Error> {
        self.row = row;
        self.col = 0;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), Error> {
        Text::with_baseline(text, self.cursor(), text_style(), Baseline::Top)
            .draw(&mut self.display)
            .map_err(|_| Error::Display)?;
        self.col += text.chars().count() as u32;
        Ok(())
    }

    fn clear_to_eol(&mut self) -> Result<(), Error> {
        let x = self.col * CHAR_WIDTH;
        if x >= PANEL_WIDTH {
            return Ok(());
        }
        Rectangle::new(self.cursor(), Size::new(PANEL_WIDTH - x, ROW_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.display)
            .map_err(|_| Error::Display)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.display.flush().map_err(|_| Error::Display)
    }
}

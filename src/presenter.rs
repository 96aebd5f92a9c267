//! Line-diffing display presenter.
//!
//! Keeps the last text drawn on each of the four rows and only touches
//! rows whose content changed. A redraw is "position, write, clear to
//! end of line", so a shorter string never leaves stale characters.

use heapless::String;

use crate::codec::push_truncated;
use crate::config::{DISPLAY_LINES, LINE_WIDTH};
use crate::Error;

/// One display row.
pub type Line = String<LINE_WIDTH>;

/// Character-row display primitives.
pub trait LineDisplay {
    /// Move the write position to the start of `row`.
    fn set_line(&mut self, row: u8) -> Result<(), Error>;

    /// Write `text` at the current position.
    fn write_text(&mut self, text: &str) -> Result<(), Error>;

    /// Blank from the current position to the end of the row.
    fn clear_to_eol(&mut self) -> Result<(), Error>;

    /// Push buffered changes to the panel, if the display buffers.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<D: LineDisplay> LineDisplay for &mut D {
    fn set_line(&mut self, row: u8) -> Result<(), Error> {
        (**self).set_line(row)
    }

    fn write_text(&mut self, text: &str) -> Result<(), Error> {
        (**self).write_text(text)
    }

    fn clear_to_eol(&mut self) -> Result<(), Error> {
        (**self).clear_to_eol()
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}

/// Build a display line from arbitrary text, truncating to the row width.
pub fn line(text: &str) -> Line {
    let mut out = Line::new();
    push_truncated(&mut out, text);
    out
}

#[derive(Clone, Debug, Default)]
pub struct Presenter {
    /// `None` until the row has been drawn at least once.
    cache: [Option<Line>; DISPLAY_LINES],
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the rows that differ from the cache. Returns how many rows
    /// were written.
    ///
    /// A row whose write fails is forgotten and redrawn on the next render.
    /// A failed flush does the same for every row drawn by this call.
    pub fn render<D: LineDisplay>(
        &mut self,
        display: &mut D,
        lines: &[&str; DISPLAY_LINES],
    ) -> Result<usize, Error> {
        let mut drawn = [false; DISPLAY_LINES];
        let mut result = Ok(());

        for (row, (cached, text)) in self.cache.iter_mut().zip(lines).enumerate() {
            let candidate = line(text);
            if cached.as_ref() == Some(&candidate) {
                continue;
            }

            match draw_row(display, row as u8, &candidate) {
                Ok(()) => {
                    *cached = Some(candidate);
                    drawn[row] = true;
                }
                Err(e) => {
                    *cached = None;
                    result = Err(e);
                }
            }
        }

        let written = drawn.iter().filter(|&&d| d).count();
        if written > 0 {
            if let Err(e) = display.flush() {
                // Nothing reached the panel.
                for (cached, _) in self.cache.iter_mut().zip(drawn).filter(|(_, d)| *d) {
                    *cached = None;
                }
                return Err(e);
            }
        }
        result.map(|()| written)
    }
}

fn draw_row<D: LineDisplay>(display: &mut D, row: u8, text: &str) -> Result<(), Error> {
    display.set_line(row)?;
    display.write_text(text)?;
    display.clear_to_eol()
}

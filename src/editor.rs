//! Cursor-based name editing.
//!
//! The buffer is always exactly [`NAME_MAX_LEN`] characters drawn from
//! [`NAME_ALPHABET`], right-padded with spaces. Committing hands the
//! text to [`IdentityStore::save`], which trims and sanitizes it.

use heapless::String;

use crate::config::{NAME_ALPHABET, NAME_MAX_LEN};
use crate::identity::{Identity, IdentityStore, NvStore};
use crate::Error;

/// Character after (`step = 1`) or before (`step = -1`) `current` in the
/// alphabet, wrapping at both ends. Characters outside the alphabet are
/// treated as its first symbol.
pub fn cycle_char(current: u8, step: i8) -> u8 {
    let count = NAME_ALPHABET.len() as i32;
    let index = NAME_ALPHABET
        .iter()
        .position(|&c| c == current)
        .unwrap_or(0) as i32;
    let next = (index + step as i32).rem_euclid(count);
    NAME_ALPHABET[next as usize]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameEditor {
    buffer: [u8; NAME_MAX_LEN],
    cursor: usize,
}

impl NameEditor {
    /// Start editing `identity`, cursor on the first character.
    pub fn new(identity: &Identity) -> Self {
        let mut buffer = [b' '; NAME_MAX_LEN];
        for (slot, b) in buffer.iter_mut().zip(identity.as_str().bytes()) {
            *slot = b;
        }
        Self { buffer, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The full padded buffer.
    pub fn text(&self) -> &str {
        // Only alphabet bytes ever reach the buffer.
        core::str::from_utf8(&self.buffer).unwrap_or("")
    }

    pub fn next_char(&mut self) {
        self.cycle(1);
    }

    pub fn prev_char(&mut self) {
        self.cycle(-1);
    }

    fn cycle(&mut self, step: i8) {
        let slot = &mut self.buffer[self.cursor];
        *slot = cycle_char(*slot, step);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1) % NAME_MAX_LEN;
    }

    pub fn cursor_left(&mut self) {
        self.cursor = (self.cursor + NAME_MAX_LEN - 1) % NAME_MAX_LEN;
    }

    /// Blank the buffer and home the cursor.
    pub fn clear(&mut self) {
        self.buffer = [b' '; NAME_MAX_LEN];
        self.cursor = 0;
    }

    /// Persist the buffer and return the identity now in effect.
    pub fn commit<S: NvStore>(self, store: &mut IdentityStore<S>) -> Result<Identity, Error> {
        let saved = store.save(self.text())?;
        info!("naming: committed");
        Ok(saved)
    }

    /// The cursor marker row: `^` under the cursor when `visible`.
    pub fn cursor_line(&self, visible: bool) -> String<NAME_MAX_LEN> {
        let mut line = String::new();
        for i in 0..NAME_MAX_LEN {
            let c = if visible && i == self.cursor { '^' } else { ' ' };
            let _ = line.push(c);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ByteImage;

    fn editor(name: &str) -> NameEditor {
        NameEditor::new(&Identity::sanitized(name))
    }

    #[test]
    fn seeded_from_identity_and_padded() {
        let e = editor("amy");
        assert_eq!(e.text(), "amy             ");
        assert_eq!(e.text().len(), NAME_MAX_LEN);
        assert_eq!(e.cursor(), 0);
    }

    #[test]
    fn char_cycles_wrap_both_ways() {
        assert_eq!(cycle_char(b'a', -1), b' ');
        assert_eq!(cycle_char(b' ', 1), b'a');
        assert_eq!(cycle_char(b'a', 1), b'b');
        assert_eq!(cycle_char(b'z', 1), b' ');
        assert_eq!(cycle_char(b'?', 1), b'b');
    }

    #[test]
    fn editing_changes_character_under_cursor() {
        let mut e = editor("amy");
        e.next_char();
        assert_eq!(&e.text()[..3], "bmy");
        e.cursor_right();
        e.prev_char();
        e.prev_char();
        assert_eq!(&e.text()[..3], "bky");
    }

    #[test]
    fn cursor_wraps_modulo_width() {
        let mut e = editor("amy");
        e.cursor_left();
        assert_eq!(e.cursor(), NAME_MAX_LEN - 1);
        e.cursor_right();
        assert_eq!(e.cursor(), 0);
        for _ in 0..NAME_MAX_LEN {
            e.cursor_right();
        }
        assert_eq!(e.cursor(), 0);
    }

    #[test]
    fn clear_blanks_and_homes() {
        let mut e = editor("amy");
        e.cursor_right();
        e.clear();
        assert_eq!(e.text(), "                ");
        assert_eq!(e.cursor(), 0);
    }

    #[test]
    fn commit_persists_trimmed_name() {
        let mut store = IdentityStore::new(ByteImage::<32>::erased());
        let mut e = editor("amy");
        for _ in 0..3 {
            e.cursor_right();
        }
        e.next_char(); // ' ' -> 'a'
        let saved = e.commit(&mut store).unwrap();
        assert_eq!(saved.as_str(), "amya");
        assert_eq!(store.load().as_str(), "amya");
    }

    #[test]
    fn commit_of_blank_buffer_stores_default() {
        let mut store = IdentityStore::new(ByteImage::<32>::erased());
        let mut e = editor("amy");
        e.clear();
        let saved = e.commit(&mut store).unwrap();
        assert_eq!(saved, Identity::default());
    }

    #[test]
    fn cursor_line_marks_position() {
        let mut e = editor("amy");
        e.cursor_right();
        e.cursor_right();
        assert_eq!(e.cursor_line(true).as_str(), "  ^             ");
        assert_eq!(e.cursor_line(false).as_str(), "                ");
    }
}

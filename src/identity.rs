//! Persisted user identity.
//!
//! The identity is a short lowercase name kept in a contiguous byte run
//! of non-volatile storage:
//!
//! ```text
//! addr+0 .. addr+15 : name bytes (a-z, space)
//! addr+len          : 0x00 terminator when len < 16
//! ```
//!
//! A first byte of 0x00 or 0xFF means "never written". Anything that
//! does not sanitize to a printable name resolves to [`DEFAULT_NAME`].

use heapless::String;

use crate::codec::push_truncated;
use crate::config::{DEFAULT_NAME, NAME_MAX_LEN, NAME_STORAGE_ADDR};
use crate::Error;

/// Byte-addressable non-volatile storage.
pub trait NvStore {
    /// Read one byte.
    fn read(&mut self, addr: usize) -> Result<u8, Error>;

    /// Write one byte unconditionally.
    fn write(&mut self, addr: usize, value: u8) -> Result<(), Error>;

    /// Write one byte only if it differs from what is stored.
    fn update(&mut self, addr: usize, value: u8) -> Result<(), Error> {
        if self.read(addr)? != value {
            self.write(addr, value)?;
        }
        Ok(())
    }
}

/// Printable user name, never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity(String<NAME_MAX_LEN>);

impl Identity {
    /// Build from arbitrary text: truncate, replace anything outside
    /// `a-z`/space with a space, and fall back to the default when
    /// nothing printable is left.
    pub fn sanitized(text: &str) -> Self {
        let mut name = String::new();
        for c in text.chars() {
            let c = if is_name_char(c) { c } else { ' ' };
            if name.push(c).is_err() {
                break;
            }
        }
        if name.chars().all(|c| c == ' ') {
            return Self::default();
        }
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Name with trailing spaces removed.
    pub fn trimmed(&self) -> &str {
        self.0.trim_end_matches(' ')
    }
}

impl Default for Identity {
    fn default() -> Self {
        let mut name = String::new();
        push_truncated(&mut name, DEFAULT_NAME);
        Self(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Identity {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.0.as_str())
    }
}

/// True for characters allowed in a name.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c == ' '
}

/// Maps the raw byte region to a validated [`Identity`].
pub struct IdentityStore<S: NvStore> {
    storage: S,
    base: usize,
}

impl<S: NvStore> IdentityStore<S> {
    /// Store rooted at [`NAME_STORAGE_ADDR`].
    pub fn new(storage: S) -> Self {
        Self::at(storage, NAME_STORAGE_ADDR)
    }

    pub fn at(storage: S, base: usize) -> Self {
        Self { storage, base }
    }

    /// Load the persisted name. Never fails: unset, unreadable or
    /// unprintable records give the default identity.
    pub fn load(&mut self) -> Identity {
        match self.read_raw() {
            Ok(Some(raw)) => {
                let identity = Identity::sanitized(&raw);
                if identity == Identity::default() {
                    info!("identity: stored name unusable, using default");
                }
                identity
            }
            Ok(None) => {
                info!("identity: unset, using default");
                Identity::default()
            }
            Err(_) => {
                warn!("identity: storage read failed, using default");
                Identity::default()
            }
        }
    }

    fn read_raw(&mut self) -> Result<Option<String<NAME_MAX_LEN>>, Error> {
        let first = self.storage.read(self.base)?;
        if first == 0x00 || first == 0xFF {
            return Ok(None);
        }

        let mut raw = String::new();
        for i in 0..NAME_MAX_LEN {
            let b = self.storage.read(self.base + i)?;
            if b == 0x00 || b == 0xFF {
                break;
            }
            // Non-ASCII bytes sanitize to a space anyway.
            let c = if b.is_ascii() { b as char } else { ' ' };
            let _ = raw.push(c);
        }
        Ok(Some(raw))
    }

    /// Persist `name` and return what was actually stored.
    ///
    /// Trailing spaces are trimmed; an empty or unprintable name stores
    /// the default. Bytes already holding the right value are not
    /// rewritten.
    pub fn save(&mut self, name: &str) -> Result<Identity, Error> {
        let identity = Identity::sanitized(name.trim_end_matches(' '));
        let text = identity.trimmed();

        for (i, b) in text.bytes().enumerate() {
            self.storage.update(self.base + i, b)?;
        }
        if text.len() < NAME_MAX_LEN {
            self.storage.update(self.base + text.len(), 0x00)?;
        }

        info!("identity: saved {=str}", text);
        Ok(Identity::sanitized(text))
    }

    /// Access the underlying storage (e.g. to flush it).
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// In-RAM image of a small non-volatile region.
///
/// Reads and writes are plain array accesses; `dirty` records whether
/// anything changed since the image was last persisted.
#[derive(Clone, Debug)]
pub struct ByteImage<const N: usize> {
    bytes: [u8; N],
    dirty: bool,
    writes: usize,
}

impl<const N: usize> ByteImage<N> {
    /// Image of erased storage (all 0xFF).
    pub const fn erased() -> Self {
        Self {
            bytes: [0xFF; N],
            dirty: false,
            writes: 0,
        }
    }

    /// Image seeded from persisted bytes. Shorter input leaves the
    /// remainder erased.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut image = Self::erased();
        let len = data.len().min(N);
        image.bytes[..len].copy_from_slice(&data[..len]);
        image
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Number of byte writes that actually reached the image.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl<const N: usize> NvStore for ByteImage<N> {
    fn read(&mut self, addr: usize) -> Result<u8, Error> {
        self.bytes.get(addr).copied().ok_or(Error::Storage)
    }

    fn write(&mut self, addr: usize, value: u8) -> Result<(), Error> {
        let slot = self.bytes.get_mut(addr).ok_or(Error::Storage)?;
        *slot = value;
        self.dirty = true;
        self.writes += 1;
        Ok(())
    }
}

impl<S: NvStore> NvStore for &mut S {
    fn read(&mut self, addr: usize) -> Result<u8, Error> {
        (**self).read(addr)
    }

    fn write(&mut self, addr: usize, value: u8) -> Result<(), Error> {
        (**self).write(addr, value)
    }

    fn update(&mut self, addr: usize, value: u8) -> Result<(), Error> {
        (**self).update(addr, value)
    }
}

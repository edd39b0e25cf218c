//! Fixed-width 8.3 names.
//!
//! Directory lookups compare the raw 11-byte field; turning a user-facing
//! name like `log.txt` into `LOG     TXT` (and back) happens here.

use super::constants::{
    DELETED_ENTRY_MARKER, END_OF_DIR_MARKER, MAX_EXTENSION_LENGTH, MAX_FILENAME_LENGTH,
    SHORT_NAME_LEN,
};
use arrayvec::ArrayString;
use core::fmt::{self, Write};

/// Display form of a short name: 8 + '.' + 3
pub type DisplayName = ArrayString<{ SHORT_NAME_LEN + 1 }>;

/// Space-padded 8.3 name as stored in a directory entry
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortName([u8; SHORT_NAME_LEN]);

impl ShortName {
    pub const fn from_raw(raw: [u8; SHORT_NAME_LEN]) -> Self {
        Self(raw)
    }

    /// Formats `filename` into padded 8.3 form, e.g. `test.txt` becomes
    /// `TEST    TXT`. Letters are uppercased; characters past eight in the
    /// base name or three in the extension are dropped.
    pub fn new(filename: &str) -> Self {
        let mut raw = [b' '; SHORT_NAME_LEN];
        let bytes = filename.as_bytes();

        let (base, ext) = match bytes.iter().position(|&b| b == b'.') {
            Some(dot) => (&bytes[..dot], &bytes[dot + 1..]),
            None => (bytes, &[][..]),
        };

        for (dst, src) in raw[..MAX_FILENAME_LENGTH].iter_mut().zip(base) {
            *dst = src.to_ascii_uppercase();
        }
        for (dst, src) in raw[MAX_FILENAME_LENGTH..].iter_mut().zip(ext) {
            *dst = src.to_ascii_uppercase();
        }

        Self(raw)
    }

    pub const fn as_bytes(&self) -> &[u8; SHORT_NAME_LEN] {
        &self.0
    }

    /// Whether the name can occupy a directory slot without being read back
    /// as an end marker, a tombstone or padding.
    pub fn is_valid(&self) -> bool {
        let first = self.0[0];
        first != END_OF_DIR_MARKER
            && first != DELETED_ENTRY_MARKER
            && first != b' '
            && self.0.iter().all(|&b| b >= 0x20)
    }

    /// `TEST    TXT` as `TEST.TXT`
    pub fn to_display(&self) -> DisplayName {
        let mut out = DisplayName::new();
        // at most 12 single-byte characters, always fits
        let _ = write!(out, "{self}");
        out
    }

    fn base(&self) -> &[u8] {
        &self.0[..MAX_FILENAME_LENGTH]
    }

    fn extension(&self) -> &[u8] {
        &self.0[MAX_FILENAME_LENGTH..MAX_FILENAME_LENGTH + MAX_EXTENSION_LENGTH]
    }
}

fn display_char(b: u8) -> char {
    if b.is_ascii() {
        char::from(b)
    } else {
        '?'
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.base().iter().filter(|&&b| b != b' ') {
            f.write_char(display_char(b))?;
        }
        if self.extension()[0] != b' ' {
            f.write_char('.')?;
            for &b in self.extension().iter().filter(|&&b| b != b' ') {
                f.write_char(display_char(b))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortName({:?})", self.to_display().as_str())
    }
}

impl From<&str> for ShortName {
    fn from(filename: &str) -> Self {
        Self::new(filename)
    }
}

//! SHA-256 content hashing for object addressing.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Bit size of the digest accumulator.
pub const DIGEST_BITS: u32 = 256;

/// Length of a digest rendered as hex.
pub const HEX_LEN: usize = 64;

/// A SHA-256 object key (32 bytes).
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }

    /// Parse a full 64-character hex digest (either case).
    pub fn from_hex(text: &str) -> Result<Self> {
        if text.len() != HEX_LEN {
            return Err(Error::InvalidDigest(format!(
                "expected {} hex characters, got {}: {:?}",
                HEX_LEN,
                text.len(),
                text
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(text, &mut bytes)
            .map_err(|e| Error::InvalidDigest(format!("{}: {:?}", e, text)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

/// `true` if `s` is non-empty and only hex digits.
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Hash `data` to a hex string of `width` bits.
///
/// The width is mixed into the hash input, so the same bytes at two
/// different widths give unrelated strings rather than one being a prefix
/// of the other. The result has `ceil(width / 4)` hex digits; bits past
/// `width` in the final digit are zero.
///
/// # Errors
/// Returns [`Error::InvalidWidth`] when `width` is `0` or larger than
/// [`DIGEST_BITS`].
pub fn digest(data: &[u8], width: u32) -> Result<String> {
    if width == 0 || width > DIGEST_BITS {
        return Err(Error::InvalidWidth(width));
    }

    let mut hasher = Sha256::new();
    hasher.update((width as u16).to_be_bytes());
    hasher.update(data);
    let full: [u8; 32] = hasher.finalize().into();

    let digits = width.div_ceil(4) as usize;
    let mut out = hex::encode(full);
    out.truncate(digits);

    let spare = digits as u32 * 4 - width;
    if spare > 0 {
        let last = out.pop().and_then(|c| c.to_digit(16)).unwrap_or(0);
        let masked = last & (0xf << spare) & 0xf;
        out.extend(char::from_digit(masked, 16));
    }
    Ok(out)
}

/// Incremental hasher; feed it with `write_all` or `std::io::copy`.
#[derive(Default)]
pub struct DigestWriter {
    inner: Sha256,
}

impl DigestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finalize(self) -> Digest {
        Digest(self.inner.finalize().into())
    }
}

impl Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Digest a file without loading it into memory.
pub fn hash_file(path: &Path) -> Result<Digest> {
    let mut file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = DigestWriter::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.inner.update(&buffer[..n]);
    }
    Ok(hasher.finalize())
}

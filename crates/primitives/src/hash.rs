use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;


/// 32-byte content hash in internal (digest) byte order.
///
/// Textual form follows the bitcoin convention: the bytes are printed
/// in reverse order, so the last digest byte comes first.
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Hash256 {
    bytes: [u8; 32]
}


impl Hash256 {
    pub const ZERO: Hash256 = Hash256 { bytes: [0; 32] };

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Byte at `index` in digest order, `byte(0)` being the least significant
    /// byte of the displayed number.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }
}


impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}


impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }
}


impl TryFrom<&[u8]> for Hash256 {
    type Error = &'static str;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 32] = value.try_into().map_err(|_| "hash must be exactly 32 bytes long")?;
        Ok(Self { bytes })
    }
}


impl Display for Hash256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut reversed = self.bytes;
        reversed.reverse();
        f.write_str(&faster_hex::hex_string(&reversed))
    }
}


impl Debug for Hash256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}


impl FromStr for Hash256 {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err("hash string must consist of 64 hex digits")
        }
        let mut bytes = [0; 32];
        faster_hex::hex_decode(s.as_bytes(), &mut bytes).map_err(|_| "invalid hex string")?;
        bytes.reverse();
        Ok(Self { bytes })
    }
}

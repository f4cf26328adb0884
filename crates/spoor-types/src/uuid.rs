//! The 128-bit trail identifier.
//!
//! Two external representations interconvert losslessly: a 32-character
//! lowercase hex string and a 16-byte raw sequence. The canonical in-memory
//! form is the raw bytes; equality and hashing are defined on them. Instead
//! of a runtime "string or bytes?" check, each representation has its own
//! explicit constructor.

use std::fmt;

use spoor_error::{Result, SpoorError};

/// A 128-bit identifier owning one trail.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Parse the 32-character lowercase hex text form.
    ///
    /// Anything else — wrong length, separators, uppercase digits — is a
    /// schema error, so that `hex(raw(x)) == x` holds for every accepted
    /// input.
    pub fn from_hex(text: &str) -> Result<Self> {
        if text.len() != 32 {
            return Err(SpoorError::schema(format!(
                "identifier must be 32 hex chars, got {}",
                text.len()
            )));
        }
        if !text
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(SpoorError::schema(format!(
                "identifier is not lowercase hex: '{text}'"
            )));
        }
        let raw = hex::decode(text)
            .map_err(|e| SpoorError::schema(format!("identifier '{text}': {e}")))?;
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    /// Wrap the 16-byte raw form.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw 16-byte form.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The 32-character lowercase hex text form.
    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({})", self.hex())
    }
}

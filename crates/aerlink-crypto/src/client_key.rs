//! Session key sequencing.
//!
//! The device hands out an 8-hex-digit session key during the sync
//! handshake. The key doubles as key-derivation material for the envelope
//! cipher and as a freshness counter: it is advanced by one before every
//! command send.

use std::fmt;

use crate::envelope::CryptoError;

/// An 8-hex-digit session key.
///
/// Stored as the underlying 32-bit counter, so a `ClientKey` is always
/// renderable as exactly 8 uppercase hex digits - the canonical wire
/// form. Parsing accepts either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey(u32);

impl ClientKey {
    /// Number of characters in the canonical rendering.
    pub const WIRE_LEN: usize = 8;

    /// Parse a session key from its textual wire form.
    ///
    /// Requires exactly 8 hex characters; case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the input is not 8 hex
    /// characters.
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        if text.len() != Self::WIRE_LEN {
            return Err(CryptoError::InvalidKey { length: text.len() });
        }
        // `from_str_radix` alone would also admit a leading sign; every
        // character must be a hex digit.
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::InvalidKey { length: text.len() });
        }

        u32::from_str_radix(text, 16)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKey { length: text.len() })
    }

    /// The next key in the sequence.
    ///
    /// Wraps modulo 2^32. Whether the device firmware wraps identically at
    /// `FFFFFFFF` or expects a fresh handshake at that boundary is unknown;
    /// a single session is not expected to reach it.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// The underlying counter value.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for ClientKey {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientKey({:08X})", self.0)
    }
}

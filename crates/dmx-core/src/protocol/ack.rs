//! The one-byte acknowledgment returned for every frame.

use std::fmt;

/// Byte the bus driver sends after each received frame (ASCII `'A'`).
pub const ACK_BYTE: u8 = b'A';

/// A single acknowledgment byte read back from the bus driver.
///
/// The value is preserved for diagnostics but carries no meaning beyond
/// "exchange complete": clients must not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ack(u8);

impl Ack {
    /// Wraps a raw acknowledgment byte.
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw byte exactly as it was received.
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Ack {
    fn default() -> Self {
        Self(ACK_BYTE)
    }
}

impl From<u8> for Ack {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

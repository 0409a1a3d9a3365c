//! Wire-level constants and the acknowledgment type.
//!
//! The TCP exchange has no header and no length prefix: a frame is exactly
//! [`crate::CHANNEL_COUNT`] raw bytes and the receiver relies on the byte count
//! alone.  Each frame is answered by a single acknowledgment byte.

pub mod ack;
pub mod timing;

pub use ack::{Ack, ACK_BYTE};

/// Conventional TCP port of the bus driver.
///
/// This is a project convention, not an assigned or standard port.
pub const DEFAULT_PORT: u16 = 5419;

//! Timing constants for driving the physical DMX512 line.
//!
//! The TCP side of the protocol has no timing requirements.  These values are
//! used by the bus driver when it replays a frame onto the serial line:
//!
//! ```text
//! [break ≥ 100 µs][start code 0x00][512 channel slots][idle until drained]
//! ```

use std::time::Duration;

/// Serial speed mandated by DMX512 (8 data bits, no parity, 2 stop bits).
pub const DMX_BAUD: u32 = 250_000;

/// Start code that marks an ordinary dimmer-data packet.
pub const NULL_START_CODE: u8 = 0x00;

/// Slots on the line per packet: the start code plus every channel.
pub const LINE_PACKET_LEN: usize = 1 + crate::CHANNEL_COUNT;

/// How long the line is held in the break condition before each packet.
pub const DEFAULT_BREAK: Duration = Duration::from_micros(100);

/// Slots waited for after a write so the UART's hardware FIFO can drain.
///
/// Deliberately larger than [`LINE_PACKET_LEN`]: the OS only reports when
/// bytes reached the UART, not when they left the wire.
pub const DRAIN_SLOTS: u32 = 600;

/// Bits per slot used for the drain estimate.
pub const BITS_PER_SLOT: u32 = 10;

/// Returns how long `slots` slots take on a line running at `baud`.
///
/// A `baud` of zero yields [`Duration::ZERO`].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use dmx_core::protocol::timing::{line_time, DMX_BAUD};
///
/// assert_eq!(line_time(600, DMX_BAUD), Duration::from_millis(24));
/// ```
pub fn line_time(slots: u32, baud: u32) -> Duration {
    if baud == 0 {
        return Duration::ZERO;
    }
    let bits = u64::from(slots) * u64::from(BITS_PER_SLOT);
    Duration::from_micros(bits * 1_000_000 / u64::from(baud))
}

/// Idle time after each packet at the standard DMX speed (24 ms).
pub fn default_drain_time() -> Duration {
    line_time(DRAIN_SLOTS, DMX_BAUD)
}

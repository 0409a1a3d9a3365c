//! # dmx-core
//!
//! Shared library for the DMX-over-TCP client and bus driver.
//!
//! This crate is used by both `dmx-client` and `dmx-server`.  It has no
//! dependencies on sockets, serial ports, or an async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! DMX512 is a lighting-control protocol: a controller repeatedly sends a
//! snapshot of 512 one-byte channel values (a *frame*) down a serial line, and
//! every fixture on the line picks out the channels it is wired to.
//!
//! In this project the controller does not own the serial line.  Instead it
//! opens a TCP connection to a small *bus driver* that owns the line.  Each
//! exchange on that connection is:
//!
//! ```text
//! controller ── 512 raw bytes ──▶ bus driver ── break + 0x00 + 512 bytes ──▶ DMX line
//! controller ◀── 1 ack byte ──── bus driver
//! ```
//!
//! This crate defines the pieces both sides agree on:
//!
//! - **`frame`** – [`DmxFrame`], the fixed-length 512-channel value type.
//! - **`protocol`** – the acknowledgment byte, the default TCP port, and the
//!   timing constants for driving the physical DMX line.

pub mod frame;
pub mod protocol;

pub use frame::{DmxFrame, FrameError, CHANNEL_COUNT};
pub use protocol::ack::{Ack, ACK_BYTE};
pub use protocol::DEFAULT_PORT;

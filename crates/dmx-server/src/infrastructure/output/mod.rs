//! [`DmxOutput`](crate::application::DmxOutput) implementations.
//!
//! - `open_dmx`  – Enttec OpenDMX USB (FTDI serial adapter driven directly).
//! - `recording` – in-memory output for `--dry-run` and tests.

pub mod open_dmx;
pub mod recording;

pub use open_dmx::OpenDmxOutput;
pub use recording::RecordingOutput;

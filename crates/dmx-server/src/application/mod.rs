//! Application layer for dmx-server.

pub mod relay;

pub use relay::{DmxOutput, FrameRelay, OutputError};

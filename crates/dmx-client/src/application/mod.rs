//! Application layer for dmx-client.
//!
//! - `frame_loop` – repeatedly sends frames over one connection until a frame
//!   limit, a shutdown request, or the first failed exchange.

pub mod frame_loop;

pub use frame_loop::{run_frame_loop, ChannelRamp, FrameStep, LoopError, LoopReport};

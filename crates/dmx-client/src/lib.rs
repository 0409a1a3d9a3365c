//! dmx-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does dmx-client do? (for beginners)
//!
//! The client is the *controller* side of a DMX-over-TCP link.  It does not
//! talk to lighting hardware directly; a bus driver (see `dmx-server`) owns
//! the serial DMX line and the client hands it one frame at a time:
//!
//! 1. Connect to the bus driver over TCP (default port 5419).
//! 2. Write exactly 512 bytes: one value per DMX channel.
//! 3. Wait for a single acknowledgment byte.
//! 4. Repeat from step 2 with the next frame.
//!
//! There is never more than one frame in flight on a connection, and no
//! automatic reconnection: when an exchange fails the caller decides what to
//! do next.

/// Application layer: the frame loop that drives a connection.
pub mod application;

/// Infrastructure layer: the TCP frame transport.
pub mod infrastructure;

pub use infrastructure::transport::{
    ConnectionState, FrameConnection, LossCause, TransportConfig, TransportError,
};

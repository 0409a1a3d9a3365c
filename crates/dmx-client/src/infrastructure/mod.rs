//! Infrastructure layer for dmx-client.
//!
//! Everything that touches a socket lives here.  The application layer only
//! sees [`transport::FrameConnection`] and its error type.

pub mod transport;

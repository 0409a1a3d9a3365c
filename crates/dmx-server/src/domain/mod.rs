//! Domain layer for dmx-server.
//!
//! Plain configuration types.  Reading them from disk or the command line is
//! the infrastructure layer's and `main.rs`'s job.

pub mod config;

pub use config::{ConfigError, NetworkConfig, SerialConfig, ServerConfig};

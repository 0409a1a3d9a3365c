//! Infrastructure layer for dmx-server.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and accepting clients
//! - Reading fixed-size frames and writing acknowledgments
//! - Driving the serial DMX line (break, start code, data, drain)
//! - Loading the TOML configuration file

pub mod config_file;
pub mod output;
pub mod server;

pub use server::{bind, run_server, serve};

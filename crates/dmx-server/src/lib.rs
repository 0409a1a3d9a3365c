//! dmx-server library crate.
//!
//! The bus driver that sits between DMX-over-TCP clients and a physical DMX512
//! line driven by an Enttec OpenDMX USB interface.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! dmx-client (512 raw bytes per frame over TCP)
//!         ↕  1 ack byte per frame
//! [dmx-server]
//!   ├── domain/           ServerConfig (network, serial, logging settings)
//!   ├── application/      FrameRelay + DmxOutput trait: one line, many clients
//!   └── infrastructure/
//!         ├── server/      TCP accept loop and per-client sessions
//!         ├── output/      OpenDMX serial output, in-memory recording output
//!         └── config_file/ TOML loading
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `dmx-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and `serialport`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: serialised access to the DMX output.
pub mod application;

/// Infrastructure layer: TCP server, serial output, config file.
pub mod infrastructure;

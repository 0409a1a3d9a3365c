//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  It is
//! usually read from a TOML file (see `infrastructure::config_file`) and then
//! patched with command-line overrides in `main.rs`.
//!
//! ```toml
//! log_level = "info"
//!
//! [network]
//! bind_address = "0.0.0.0"
//! port = 5419
//!
//! [serial]
//! device = "/dev/ttyUSB0"
//! break_us = 100
//! drain_us = 24000
//! ```
//!
//! Every field has a serde default, so an empty file (or no file at all) gives
//! a working configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use dmx_core::protocol::timing::{default_drain_time, DEFAULT_BREAK};
use dmx_core::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `bind_address` and `port` do not form a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub serial: SerialConfig,
}

/// TCP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port clients connect to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Serial DMX line settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerialConfig {
    /// TTY or COM port of the OpenDMX interface.
    #[serde(default = "default_device")]
    pub device: String,
    /// Break length before each packet, in microseconds.
    #[serde(default = "default_break_us")]
    pub break_us: u64,
    /// Idle time after each packet so the UART FIFO drains, in microseconds.
    #[serde(default = "default_drain_us")]
    pub drain_us: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_device() -> String {
    if cfg!(target_os = "windows") {
        "COM3".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}
fn default_break_us() -> u64 {
    DEFAULT_BREAK.as_micros() as u64
}
fn default_drain_us() -> u64 {
    default_drain_time().as_micros() as u64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            network: NetworkConfig::default(),
            serial: SerialConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            break_us: default_break_us(),
            drain_us: default_drain_us(),
        }
    }
}

impl ServerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a field has
    /// the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl NetworkConfig {
    /// Combines `bind_address` and `port` into a listener address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if `bind_address` is not
    /// an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let text = format!("{}:{}", self.bind_address, self.port);
        text.parse()
            .map_err(|_| ConfigError::InvalidBindAddress(text))
    }
}

impl SerialConfig {
    /// Break length as a [`Duration`].
    pub fn break_time(&self) -> Duration {
        Duration::from_micros(self.break_us)
    }

    /// Post-packet drain time as a [`Duration`].
    pub fn drain_time(&self) -> Duration {
        Duration::from_micros(self.drain_us)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_on_5419_all_interfaces() {
        // Arrange / Act
        let cfg = ServerConfig::default();

        // Assert
        let addr = cfg.network.socket_addr().unwrap();
        assert_eq!(addr.port(), 5419);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_default_serial_timing_matches_dmx_line() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.break_time(), Duration::from_micros(100));
        assert_eq!(cfg.drain_time(), Duration::from_millis(24));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        // Arrange
        let toml_str = r#"
log_level = "debug"

[network]
port = 6000

[serial]
device = "/dev/ttyACM1"
"#;

        // Act
        let cfg = ServerConfig::from_toml_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.network.port, 6000);
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert_eq!(cfg.serial.device, "/dev/ttyACM1");
        assert_eq!(cfg.serial.break_us, 100);
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = ServerConfig::from_toml_str("[network]\nport = \"not a number\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let mut cfg = ServerConfig::default();
        cfg.network.bind_address = "127.0.0.1".to_string();
        cfg.serial.drain_us = 30_000;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = ServerConfig::from_toml_str(&text).unwrap();

        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_hostname_bind_address_is_rejected() {
        let net = NetworkConfig {
            bind_address: "localhost".to_string(),
            port: 5419,
        };
        assert!(matches!(
            net.socket_addr(),
            Err(ConfigError::InvalidBindAddress(_))
        ));
    }
}

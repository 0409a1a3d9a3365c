//! DMX-over-TCP client: entry point.
//!
//! Connects to a DMX bus driver and streams frames to it, one exchange at a
//! time, until a frame limit is reached, Ctrl+C is pressed, or an exchange
//! fails.  Each frame is derived from the previous one by ramping a set of
//! channels, which makes it easy to see on the connected fixtures (or in the
//! server's dry-run log) that frames arrive in order.
//!
//! # Usage
//!
//! ```text
//! dmx-client [OPTIONS]
//!
//! Options:
//!   --host <HOST>                 Bus driver hostname or IP [default: localhost]
//!   --port <PORT>                 Bus driver TCP port [default: 5419]
//!   --ack-timeout-ms <MS>         Acknowledgment timeout, 0 disables [default: 5000]
//!   --connect-timeout-ms <MS>     TCP handshake timeout, 0 disables [default: 5000]
//!   --frames <N>                  Stop after N frames [default: run until Ctrl+C]
//!   --rise <CH,...>               1-based channels to ramp up [default: 1]
//!   --fall <CH,...>               1-based channels to ramp down
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Default     | Description                     |
//! |--------------------------|-------------|---------------------------------|
//! | `DMX_HOST`               | `localhost` | Bus driver hostname or IP       |
//! | `DMX_PORT`               | `5419`      | Bus driver TCP port             |
//! | `DMX_ACK_TIMEOUT_MS`     | `5000`      | Acknowledgment timeout (ms)     |
//! | `DMX_CONNECT_TIMEOUT_MS` | `5000`      | TCP handshake timeout (ms)      |
//! | `DMX_FRAMES`             | unset       | Frame limit                     |

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dmx_client::application::{run_frame_loop, ChannelRamp};
use dmx_client::{FrameConnection, TransportConfig};
use dmx_core::{DmxFrame, DEFAULT_PORT};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// DMX-over-TCP frame sender.
#[derive(Debug, Parser)]
#[command(
    name = "dmx-client",
    about = "Streams DMX512 frames to a DMX-over-TCP bus driver",
    version
)]
struct Cli {
    /// Hostname or IP address of the bus driver.
    #[arg(long, default_value = "localhost", env = "DMX_HOST")]
    host: String,

    /// TCP port of the bus driver.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "DMX_PORT")]
    port: u16,

    /// Milliseconds to wait for each acknowledgment.  0 waits forever.
    #[arg(long, default_value_t = 5000, env = "DMX_ACK_TIMEOUT_MS")]
    ack_timeout_ms: u64,

    /// Milliseconds allowed for the TCP handshake.  0 leaves it to the OS.
    #[arg(long, default_value_t = 5000, env = "DMX_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: u64,

    /// Number of frames to send before exiting.  Runs until Ctrl+C if absent.
    #[arg(long, env = "DMX_FRAMES")]
    frames: Option<u64>,

    /// 1-based channels incremented by one every frame.
    #[arg(long, value_delimiter = ',', default_value = "1")]
    rise: Vec<usize>,

    /// 1-based channels decremented by one every frame.
    #[arg(long, value_delimiter = ',')]
    fall: Vec<usize>,
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`TransportConfig`].
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            host: self.host.clone(),
            port: self.port,
            ack_timeout: millis(self.ack_timeout_ms),
            connect_timeout: millis(self.connect_timeout_ms),
        }
    }

    /// Builds the per-frame channel ramp.
    ///
    /// # Errors
    ///
    /// Returns an error if any channel is outside `1..=512`.
    fn ramp(&self) -> anyhow::Result<ChannelRamp> {
        ChannelRamp::new(&self.rise, &self.fall).context("invalid --rise/--fall channel list")
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.transport_config();
    let mut ramp = cli.ramp()?;

    let mut conn = FrameConnection::connect_with(&config)
        .await
        .with_context(|| format!("failed to connect to DMX server {}", config.endpoint()))?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; stopping after the current frame");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Frame loop ────────────────────────────────────────────────────────────
    let report = run_frame_loop(&mut conn, DmxFrame::new(), &mut ramp, cli.frames, &running)
        .await
        .context("frame loop aborted")?;

    if let Some(ack) = report.last_ack {
        info!("last acknowledgment byte: {ack}");
    }
    conn.close().await.context("failed to close connection")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        // Arrange / Act
        let cli = Cli::parse_from(["dmx-client"]);

        // Assert
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 5419);
        assert_eq!(cli.ack_timeout_ms, 5000);
        assert_eq!(cli.frames, None);
        assert_eq!(cli.rise, vec![1]);
        assert!(cli.fall.is_empty());
    }

    #[test]
    fn test_cli_channel_lists_are_comma_separated() {
        let cli = Cli::parse_from(["dmx-client", "--rise", "1,2,6", "--fall", "8"]);
        assert_eq!(cli.rise, vec![1, 2, 6]);
        assert_eq!(cli.fall, vec![8]);
    }

    #[test]
    fn test_zero_ack_timeout_disables_timeout() {
        let cli = Cli::parse_from(["dmx-client", "--ack-timeout-ms", "0"]);
        assert_eq!(cli.transport_config().ack_timeout, None);
    }

    #[test]
    fn test_transport_config_uses_host_and_port() {
        let cli = Cli::parse_from(["dmx-client", "--host", "10.0.0.7", "--port", "6000"]);
        let cfg = cli.transport_config();
        assert_eq!(cfg.endpoint(), "10.0.0.7:6000");
        assert_eq!(cfg.ack_timeout, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_every_transport_flag_has_env_fallback() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
                .and_then(|v| v.to_str())
                .map(str::to_string)
        };

        assert_eq!(env_of("host").as_deref(), Some("DMX_HOST"));
        assert_eq!(env_of("port").as_deref(), Some("DMX_PORT"));
        assert_eq!(env_of("ack_timeout_ms").as_deref(), Some("DMX_ACK_TIMEOUT_MS"));
        assert_eq!(
            env_of("connect_timeout_ms").as_deref(),
            Some("DMX_CONNECT_TIMEOUT_MS")
        );
    }

    #[test]
    fn test_out_of_range_channel_is_rejected() {
        let cli = Cli::parse_from(["dmx-client", "--rise", "600"]);
        assert!(cli.ramp().is_err());
    }
}

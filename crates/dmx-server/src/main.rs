//! DMX-over-TCP bus driver: entry point.
//!
//! Listens for DMX-over-TCP clients and replays every frame they send onto a
//! DMX512 line through an Enttec OpenDMX USB interface.
//!
//! # Usage
//!
//! ```text
//! dmx-server [OPTIONS]
//!
//! Options:
//!   -c, --config <PATH>    TOML config file [default: dmx-server.toml]
//!   -d, --device <PATH>    Serial device of the OpenDMX interface
//!   -p, --port <PORT>      TCP port to listen on
//!       --bind <ADDR>      IP address to bind to
//!       --dry-run          Record frames in memory instead of opening a device
//! ```
//!
//! Command-line values override the config file, which overrides the built-in
//! defaults (`0.0.0.0:5419`, `/dev/ttyUSB0`).

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dmx_server::application::{DmxOutput, FrameRelay};
use dmx_server::domain::ServerConfig;
use dmx_server::infrastructure::config_file::load_config;
use dmx_server::infrastructure::output::{OpenDmxOutput, RecordingOutput};
use dmx_server::infrastructure::run_server;

/// Frames kept in memory by `--dry-run`.
const DRY_RUN_HISTORY: usize = 16;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// DMX-over-TCP bus driver for Enttec OpenDMX USB interfaces.
#[derive(Debug, Parser)]
#[command(
    name = "dmx-server",
    about = "Accepts DMX512 frames over TCP and forwards them to an OpenDMX interface",
    version
)]
struct Cli {
    /// Path to the TOML config file.  A missing file means "use defaults".
    #[arg(short, long, default_value = "dmx-server.toml", env = "DMX_SERVER_CONFIG")]
    config: PathBuf,

    /// Serial device (TTY or COM port) of the OpenDMX interface.
    #[arg(short, long, env = "DMX_DEVICE")]
    device: Option<String>,

    /// TCP port to listen on.
    #[arg(short, long, env = "DMX_PORT")]
    port: Option<u16>,

    /// IP address to bind to.
    #[arg(long)]
    bind: Option<String>,

    /// Do not open a serial device; keep frames in memory and log them at debug level.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of `config`.
    fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(device) = &self.device {
            config.serial.device = device.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(bind) = &self.bind {
            config.network.bind_address = bind.clone();
        }
        config
    }
}

fn open_output(cli: &Cli, config: &ServerConfig) -> anyhow::Result<Box<dyn DmxOutput>> {
    if cli.dry_run {
        return Ok(Box::new(RecordingOutput::bounded(DRY_RUN_HISTORY)));
    }
    let output = OpenDmxOutput::open(&config.serial)
        .with_context(|| format!("failed to open DMX interface {}", config.serial.device))?;
    Ok(Box::new(output))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let config = cli.apply(config);

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let addr = config.network.socket_addr()?;
    let relay = FrameRelay::new(open_output(&cli, &config)?);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(addr, relay, running).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

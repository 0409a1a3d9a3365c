//! TCP server: accept loop and per-client sessions.
//!
//! # Session protocol
//!
//! ```text
//! loop {
//!     read exactly 512 bytes         ── EOF at a frame boundary: session ends
//!                                    ── EOF mid-frame: partial frame dropped, session ends
//!     put the frame on the DMX line  ── output failure: session ends, no ack
//!     write 1 ack byte ('A')
//! }
//! ```
//!
//! Frames are delimited purely by byte count.  A single `read()` may return
//! part of a frame or the tail of one frame and the head of the next; the
//! session keeps reading until exactly 512 bytes have been collected.
//!
//! # Concurrency
//!
//! Each client runs in its own Tokio task.  All tasks share one
//! [`FrameRelay`], which serialises access to the physical line.  Shutdown is
//! triggered by clearing the shared `running` flag; the accept loop polls it
//! every 200 ms.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use dmx_core::{DmxFrame, ACK_BYTE, CHANNEL_COUNT};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::relay::{FrameRelay, OutputError};

/// How often the accept loop wakes up to check the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Why a client session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading a frame or writing the acknowledgment failed.
    #[error("client I/O error: {0}")]
    Io(#[from] io::Error),
    /// The DMX output rejected the frame.
    #[error("DMX output failed: {0}")]
    Output(#[from] OutputError),
}

/// Result of trying to read one frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameRead {
    Complete,
    /// The client closed the stream cleanly between frames.
    Eof,
    /// The client closed the stream after sending this many bytes of a frame.
    Partial(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the TCP listener at `addr`.
///
/// # Errors
///
/// Returns an error if the port is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind DMX server on {addr}"))
}

/// Binds `addr` and serves clients until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(
    addr: SocketAddr,
    relay: FrameRelay,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    serve(listener, relay, running).await
}

/// Accepts clients on `listener` until `running` is cleared.
///
/// Each client gets a dedicated task; a failing session is logged and never
/// stops the accept loop.
pub async fn serve(
    listener: TcpListener,
    relay: FrameRelay,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("DMX server listening on {addr}, output: {}", relay.describe());
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("could not disable Nagle for {peer}: {e}");
                }
                let relay = relay.clone();
                tokio::spawn(async move {
                    handle_client(stream, peer, relay).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    info!(
        "DMX server stopped after {} frames",
        relay.frames_forwarded()
    );
    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Runs one client session and logs how it ended.
async fn handle_client<S>(stream: S, peer: SocketAddr, relay: FrameRelay)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session_id = Uuid::new_v4().simple().to_string();
    let session = &session_id[..8];
    info!("session {session}: connected by {peer}");

    match run_session(stream, session, &relay).await {
        Ok(frames) => info!("session {session}: {peer} disconnected after {frames} frames"),
        Err(e) => warn!("session {session}: {peer} dropped: {e}"),
    }
}

/// Reads frames, forwards them, and acknowledges them until the client leaves.
///
/// Returns the number of acknowledged frames.
///
/// # Errors
///
/// Returns [`SessionError`] on a client I/O failure or an output failure.  In
/// the latter case the frame is not acknowledged.
pub async fn run_session<S>(
    mut stream: S,
    session: &str,
    relay: &FrameRelay,
) -> Result<u64, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut frames = 0u64;
    let mut buf = [0u8; CHANNEL_COUNT];

    loop {
        match read_frame(&mut stream, &mut buf).await? {
            FrameRead::Complete => {}
            FrameRead::Eof => break,
            FrameRead::Partial(n) => {
                warn!("session {session}: discarding partial frame of {n} bytes");
                break;
            }
        }

        relay.forward(DmxFrame::from_array(buf)).await?;
        stream.write_all(&[ACK_BYTE]).await?;
        stream.flush().await?;
        frames += 1;
    }

    debug!("session {session}: {frames} frames acknowledged");
    Ok(frames)
}

/// Fills `buf` completely from `stream`.
async fn read_frame<S>(stream: &mut S, buf: &mut [u8; CHANNEL_COUNT]) -> io::Result<FrameRead>
where
    S: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Ok(if filled == 0 {
                FrameRead::Eof
            } else {
                FrameRead::Partial(filled)
            });
        }
        filled += n;
    }
    Ok(FrameRead::Complete)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

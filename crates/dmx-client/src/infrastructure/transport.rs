//! TCP frame transport to a DMX bus driver.
//!
//! # Exchange protocol
//!
//! ```text
//! client                                   bus driver
//!   │ ── 512 raw channel bytes ───────────▶ │
//!   │ ◀────────────────── 1 ack byte ────── │
//!   │ ── next 512 bytes ──────────────────▶ │
//! ```
//!
//! There is no header, length prefix, or delimiter; both sides rely on the
//! fixed byte count.  The acknowledgment byte is returned to the caller as an
//! [`Ack`] but its value is never interpreted.
//!
//! # State machine
//!
//! ```text
//! connect() ─▶ Connected ─▶ SendingFrame ─▶ AwaitingAck ─▶ Connected ─▶ …
//!                  │              │               │
//!                  └──────────────┴───────────────┴──▶ Closed  (I/O failure or close())
//! ```
//!
//! `send` takes `&mut self`, so a second frame can never be written before the
//! acknowledgment of the previous one has been read.  If a send future is
//! dropped half-way (for example by an outer `timeout`), the connection is
//! left in `SendingFrame` or `AwaitingAck`; the byte stream is then out of
//! step with the peer, so the next call closes the connection instead of
//! sending.
//!
//! # Testability
//!
//! [`FrameConnection`] is generic over any `AsyncRead + AsyncWrite + Unpin`
//! stream.  Production code uses `tokio::net::TcpStream`; unit tests drive it
//! with `tokio_test::io::Mock` scripts.

use std::io;
use std::time::Duration;

use dmx_core::{Ack, DmxFrame, FrameError, DEFAULT_PORT};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, info, trace, warn};

/// Default time to wait for an acknowledgment before the link is declared lost.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed for the TCP handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors returned by [`FrameConnection`] operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing is listening at the endpoint.
    #[error("connection to {endpoint} refused; is the DMX server running?")]
    Refused {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Any other transport-level failure (resolution, write error, timeout on connect).
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The payload is not a 512-byte frame.  No I/O was performed.
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),

    /// The peer went away (or stopped answering) between write and acknowledgment.
    #[error("connection lost: {0}")]
    ConnectionLost(LossCause),

    /// The connection was closed by an earlier failure or by [`FrameConnection::close`].
    #[error("connection is closed")]
    Closed,
}

/// Why an exchange ended in [`TransportError::ConnectionLost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LossCause {
    #[error("peer closed the stream before acknowledging the frame")]
    PeerClosed,
    #[error("stream was reset by the peer")]
    Reset,
    #[error("no acknowledgment within {0:?}")]
    AckTimeout(Duration),
}

/// Lifecycle of a [`FrameConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Idle and ready for the next frame.
    Connected,
    /// Frame bytes are being written.
    SendingFrame,
    /// Frame written; waiting for the acknowledgment byte.
    AwaitingAck,
    /// Terminal.  Every further send fails with [`TransportError::Closed`].
    Closed,
}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Hostname or literal IP address of the bus driver.
    pub host: String,
    /// TCP port of the bus driver.
    pub port: u16,
    /// Upper bound on the acknowledgment wait; `None` waits forever.
    pub ack_timeout: Option<Duration>,
    /// Upper bound on the TCP handshake; `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
}

impl TransportConfig {
    /// Returns `host:port` for log and error messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TransportConfig {
    /// | Field           | Default       |
    /// |-----------------|---------------|
    /// | host            | `localhost`   |
    /// | port            | `5419`        |
    /// | ack_timeout     | 5 seconds     |
    /// | connect_timeout | 5 seconds     |
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            ack_timeout: Some(DEFAULT_ACK_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

/// One open transport session to a bus driver.
///
/// Owned by the caller and passed by `&mut` into every send; there is no
/// shared or global connection state.
pub struct FrameConnection<S = TcpStream> {
    stream: S,
    state: ConnectionState,
    ack_timeout: Option<Duration>,
    peer: String,
    frames_acked: u64,
}

impl FrameConnection<TcpStream> {
    /// Connects to `host:port` with the default timeouts.
    ///
    /// # Errors
    ///
    /// [`TransportError::Refused`] when no listener is reachable,
    /// [`TransportError::Io`] for any other failure.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dmx_client::FrameConnection;
    ///
    /// # async fn example() -> Result<(), dmx_client::TransportError> {
    /// let mut conn = FrameConnection::connect("localhost", 5419).await?;
    /// let ack = conn.send(&[0u8; 512]).await?;
    /// # let _ = ack;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        Self::connect_with(&TransportConfig {
            host: host.to_string(),
            port,
            ..TransportConfig::default()
        })
        .await
    }

    /// Connects using every setting in `config`.
    ///
    /// # Errors
    ///
    /// Same as [`FrameConnection::connect`].  A handshake that exceeds
    /// `connect_timeout` is reported as [`TransportError::Io`] with kind
    /// `TimedOut`.
    pub async fn connect_with(config: &TransportConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint();
        let connecting = TcpStream::connect((config.host.as_str(), config.port));

        let result = match config.connect_timeout {
            Some(limit) => match time::timeout(limit, connecting).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {endpoint} timed out after {limit:?}"),
                )),
            },
            None => connecting.await,
        };

        match result {
            Ok(stream) => {
                // Frames are small and latency-bound; do not let Nagle batch them.
                stream.set_nodelay(true)?;
                info!("connected to DMX server {endpoint}");
                Ok(Self::from_stream(stream, endpoint, config.ack_timeout))
            }
            Err(source) if source.kind() == io::ErrorKind::ConnectionRefused => {
                warn!("could not connect to DMX server {endpoint}: {source}");
                Err(TransportError::Refused { endpoint, source })
            }
            Err(e) => {
                warn!("could not connect to DMX server {endpoint}: {e}");
                Err(TransportError::Io(e))
            }
        }
    }
}

impl<S> FrameConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-connected stream.  The connection starts `Connected`.
    pub fn from_stream(stream: S, peer: impl Into<String>, ack_timeout: Option<Duration>) -> Self {
        Self {
            stream,
            state: ConnectionState::Connected,
            ack_timeout,
            peer: peer.into(),
            frames_acked: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` while the connection can accept another frame.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The `host:port` (or test label) this connection was opened to.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Number of frames acknowledged on this connection so far.
    pub fn frames_acked(&self) -> u64 {
        self.frames_acked
    }

    /// Sends a raw payload as one frame and waits for its acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidFrame`] if `payload.len() != 512`; nothing
    ///   is written and the state is unchanged.
    /// - Everything [`FrameConnection::send_frame`] can return.
    pub async fn send(&mut self, payload: &[u8]) -> Result<Ack, TransportError> {
        let frame = DmxFrame::try_from(payload)?;
        self.send_frame(&frame).await
    }

    /// Sends one validated frame and waits for its acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Closed`] if the connection is no longer usable.
    /// - [`TransportError::ConnectionLost`] if the peer closes or resets the
    ///   stream, or the acknowledgment timeout expires.
    /// - [`TransportError::Io`] for any other read or write failure.
    ///
    /// Any error other than `Closed` moves the connection to `Closed`.
    pub async fn send_frame(&mut self, frame: &DmxFrame) -> Result<Ack, TransportError> {
        self.ensure_ready()?;

        self.state = ConnectionState::SendingFrame;
        if let Err(e) = self.write_frame(frame).await {
            warn!("write to {} failed: {e}", self.peer);
            self.state = ConnectionState::Closed;
            return Err(TransportError::Io(e));
        }

        self.state = ConnectionState::AwaitingAck;
        match self.read_ack().await {
            Ok(ack) => {
                self.state = ConnectionState::Connected;
                self.frames_acked += 1;
                trace!("frame {} acknowledged by {} ({ack})", self.frames_acked, self.peer);
                Ok(ack)
            }
            Err(e) => {
                warn!("exchange with {} failed: {e}", self.peer);
                self.state = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    /// Shuts down the write side and marks the connection `Closed`.
    ///
    /// Closing an already closed connection is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the shutdown itself fails; the
    /// connection is `Closed` either way.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        debug!("closing connection to {} after {} frames", self.peer, self.frames_acked);
        self.stream.shutdown().await?;
        Ok(())
    }

    fn ensure_ready(&mut self) -> Result<(), TransportError> {
        match self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Closed => Err(TransportError::Closed),
            ConnectionState::SendingFrame | ConnectionState::AwaitingAck => {
                warn!(
                    "previous exchange with {} was abandoned in state {:?}; closing",
                    self.peer, self.state
                );
                self.state = ConnectionState::Closed;
                Err(TransportError::Closed)
            }
        }
    }

    async fn write_frame(&mut self, frame: &DmxFrame) -> io::Result<()> {
        self.stream.write_all(frame.as_bytes()).await?;
        self.stream.flush().await
    }

    async fn read_ack(&mut self) -> Result<Ack, TransportError> {
        let mut byte = [0u8; 1];
        let limit = self.ack_timeout;
        let read = self.stream.read(&mut byte);

        let outcome = match limit {
            Some(limit) => match time::timeout(limit, read).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(TransportError::ConnectionLost(LossCause::AckTimeout(limit))),
            },
            None => read.await,
        };

        match outcome {
            Ok(0) => Err(TransportError::ConnectionLost(LossCause::PeerClosed)),
            Ok(_) => Ok(Ack::new(byte[0])),
            Err(e) if is_connection_reset(&e) => {
                debug!("read from {} failed: {e}", self.peer);
                Err(TransportError::ConnectionLost(LossCause::Reset))
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

fn is_connection_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dmx_core::{ACK_BYTE, CHANNEL_COUNT};
    use tokio_test::io::Builder;

    fn ramp_frame(seed: u8) -> DmxFrame {
        let mut frame = DmxFrame::new();
        for (i, v) in frame.as_bytes_mut().iter_mut().enumerate() {
            *v = seed.wrapping_add(i as u8);
        }
        frame
    }

    fn conn(mock: tokio_test::io::Mock) -> FrameConnection<tokio_test::io::Mock> {
        FrameConnection::from_stream(mock, "mock", None)
    }

    #[tokio::test]
    async fn test_send_writes_frame_verbatim_and_returns_ack() {
        // Arrange: peer expects the exact 512 bytes, then answers 'A'
        let frame = ramp_frame(3);
        let mock = Builder::new()
            .write(frame.as_bytes())
            .read(&[ACK_BYTE])
            .build();
        let mut conn = conn(mock);

        // Act
        let ack = conn.send(frame.as_bytes()).await.unwrap();

        // Assert
        assert_eq!(ack.value(), ACK_BYTE);
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(conn.frames_acked(), 1);
    }

    #[tokio::test]
    async fn test_ack_value_is_not_interpreted() {
        // Any byte counts as an acknowledgment, including 0x00 and 0xFF.
        for value in [0x00u8, 0x15, 0xFF] {
            let frame = DmxFrame::new();
            let mock = Builder::new().write(frame.as_bytes()).read(&[value]).build();
            let mut conn = conn(mock);

            let ack = conn.send_frame(&frame).await.unwrap();

            assert_eq!(ack.value(), value);
            assert!(conn.is_connected());
        }
    }

    #[tokio::test]
    async fn test_wrong_length_is_rejected_without_io() {
        // Arrange: an empty script; any write would fail with BrokenPipe
        // and surface as Io instead of InvalidFrame.
        let mut conn = conn(Builder::new().build());

        for len in [0usize, 1, CHANNEL_COUNT - 1, CHANNEL_COUNT + 1, 4096] {
            // Act
            let result = conn.send(&vec![0u8; len]).await;

            // Assert
            assert!(
                matches!(
                    result,
                    Err(TransportError::InvalidFrame(FrameError::InvalidLength { len: l })) if l == len
                ),
                "len {len}: unexpected result {result:?}"
            );
            assert_eq!(conn.state(), ConnectionState::Connected);
        }
    }

    #[tokio::test]
    async fn test_peer_close_before_ack_is_connection_lost() {
        // Arrange: the peer consumes the frame and then reaches EOF
        let frame = DmxFrame::new();
        let mock = Builder::new().write(frame.as_bytes()).build();
        let mut conn = conn(mock);

        // Act
        let result = conn.send_frame(&frame).await;

        // Assert
        assert!(matches!(
            result,
            Err(TransportError::ConnectionLost(LossCause::PeerClosed))
        ));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_reset_while_awaiting_ack_is_connection_lost() {
        let frame = DmxFrame::new();
        let mock = Builder::new()
            .write(frame.as_bytes())
            .read_error(io::Error::from(io::ErrorKind::ConnectionReset))
            .build();
        let mut conn = conn(mock);

        let result = conn.send_frame(&frame).await;

        assert!(matches!(
            result,
            Err(TransportError::ConnectionLost(LossCause::Reset))
        ));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_other_read_error_is_io() {
        let frame = DmxFrame::new();
        let mock = Builder::new()
            .write(frame.as_bytes())
            .read_error(io::Error::new(io::ErrorKind::Other, "driver fault"))
            .build();
        let mut conn = conn(mock);

        let result = conn.send_frame(&frame).await;

        assert!(matches!(result, Err(TransportError::Io(_))));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_write_error_is_io_and_closes() {
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::Other, "write failed"))
            .build();
        let mut conn = conn(mock);

        let result = conn.send_frame(&DmxFrame::new()).await;

        assert!(matches!(result, Err(TransportError::Io(_))));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_send_after_failure_is_closed_without_io() {
        // Arrange: first exchange fails (EOF), leaving the script empty
        let frame = DmxFrame::new();
        let mock = Builder::new().write(frame.as_bytes()).build();
        let mut conn = conn(mock);
        let _ = conn.send_frame(&frame).await;

        // Act
        let result = conn.send_frame(&frame).await;

        // Assert: Closed, not Io (an attempted write would hit BrokenPipe)
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_wrong_length_on_closed_connection_is_invalid_frame() {
        // Arrange
        let mut conn = conn(Builder::new().build());
        conn.close().await.unwrap();

        // Act
        let result = conn.send(&[0u8; 10]).await;

        // Assert: length is checked before connection state
        assert!(matches!(
            result,
            Err(TransportError::InvalidFrame(FrameError::InvalidLength { len: 10 }))
        ));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_consecutive_sends_each_read_one_ack() {
        // Arrange: three exchanges; the ack bytes arrive in one chunk per frame
        let frames: Vec<DmxFrame> = (0..3).map(ramp_frame).collect();
        let mut builder = Builder::new();
        for frame in &frames {
            builder.write(frame.as_bytes()).read(&[ACK_BYTE]);
        }
        let mut conn = conn(builder.build());

        // Act / Assert
        for frame in &frames {
            conn.send_frame(frame).await.unwrap();
        }
        assert_eq!(conn.frames_acked(), 3);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_sends() {
        let mut conn = conn(Builder::new().build());

        conn.close().await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(matches!(
            conn.send_frame(&DmxFrame::new()).await,
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn test_default_config_targets_local_server() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.endpoint(), "localhost:5419");
        assert_eq!(cfg.ack_timeout, Some(DEFAULT_ACK_TIMEOUT));
    }

    #[test]
    fn test_refused_error_message_names_endpoint() {
        let err = TransportError::Refused {
            endpoint: "localhost:5419".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().contains("localhost:5419"));
    }
}

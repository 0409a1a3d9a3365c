//! FrameRelay: funnels frames from any number of clients onto one DMX line.
//!
//! A DMX universe is a single physical line, so at most one packet may be on
//! the wire at a time.  The relay owns the [`DmxOutput`] behind a mutex and
//! runs every transmission on tokio's blocking pool: serial writes and the
//! sleeps that pace the line never stall the async accept loop, and two
//! client sessions can never interleave bytes on the line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dmx_core::DmxFrame;
use thiserror::Error;
use tracing::trace;

/// Error type for DMX output operations.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The output device could not be opened or configured.
    #[error("DMX device error: {0}")]
    Device(String),
    /// Writing to the line failed.
    #[error("I/O error writing to DMX line: {0}")]
    Io(#[from] std::io::Error),
    /// A previous transmission panicked while holding the output.
    #[error("DMX output is unusable after an earlier panic")]
    Poisoned,
    /// The blocking transmission task could not be joined.
    #[error("DMX output task failed: {0}")]
    Task(String),
}

/// A sink that puts complete frames on a DMX line.
///
/// Implementations may block (serial writes, line timing sleeps); the relay
/// only ever calls them from the blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait DmxOutput: Send {
    /// Transmits one frame.  Returns once the frame has left the device.
    fn transmit(&mut self, frame: &DmxFrame) -> Result<(), OutputError>;

    /// Short description for log lines (device path, "dry-run", …).
    fn describe(&self) -> String;
}

/// Shared, serialised access to a single [`DmxOutput`].
///
/// Cloning is cheap: every clone refers to the same output and counter.
#[derive(Clone)]
pub struct FrameRelay {
    output: Arc<Mutex<Box<dyn DmxOutput>>>,
    forwarded: Arc<AtomicU64>,
    description: Arc<str>,
}

impl FrameRelay {
    /// Wraps `output` for shared use.
    pub fn new(output: Box<dyn DmxOutput>) -> Self {
        let description: Arc<str> = output.describe().into();
        Self {
            output: Arc::new(Mutex::new(output)),
            forwarded: Arc::new(AtomicU64::new(0)),
            description,
        }
    }

    /// Puts `frame` on the line, waiting for any transmission in progress.
    ///
    /// # Errors
    ///
    /// Returns the output's [`OutputError`], [`OutputError::Poisoned`] if an
    /// earlier transmission panicked, or [`OutputError::Task`] if the blocking
    /// task was cancelled.
    pub async fn forward(&self, frame: DmxFrame) -> Result<(), OutputError> {
        let output = Arc::clone(&self.output);
        let transmitted = tokio::task::spawn_blocking(move || {
            let mut guard = output.lock().map_err(|_| OutputError::Poisoned)?;
            guard.transmit(&frame)
        })
        .await
        .map_err(|e| OutputError::Task(e.to_string()))?;
        transmitted?;

        let count = self.forwarded.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("frame {count} transmitted on {}", self.description);
        Ok(())
    }

    /// Total frames transmitted through this relay (all clients).
    pub fn frames_forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Description of the wrapped output.
    pub fn describe(&self) -> &str {
        &self.description
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn mock_output() -> MockDmxOutput {
        let mut mock = MockDmxOutput::new();
        mock.expect_describe().return_const("mock".to_string());
        mock
    }

    #[tokio::test]
    async fn test_forward_passes_frame_unchanged() {
        // Arrange
        let mut frame = DmxFrame::new();
        frame[0] = 10;
        frame[511] = 20;
        let mut mock = mock_output();
        mock.expect_transmit()
            .with(eq(frame.clone()))
            .times(1)
            .returning(|_| Ok(()));
        let relay = FrameRelay::new(Box::new(mock));

        // Act
        relay.forward(frame).await.unwrap();

        // Assert
        assert_eq!(relay.frames_forwarded(), 1);
        assert_eq!(relay.describe(), "mock");
    }

    #[tokio::test]
    async fn test_output_failure_is_returned_and_not_counted() {
        let mut mock = mock_output();
        mock.expect_transmit()
            .times(1)
            .returning(|_| Err(OutputError::Device("unplugged".to_string())));
        let relay = FrameRelay::new(Box::new(mock));

        let result = relay.forward(DmxFrame::new()).await;

        assert!(matches!(result, Err(OutputError::Device(_))));
        assert_eq!(relay.frames_forwarded(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_one_output_and_counter() {
        // Arrange
        let mut mock = mock_output();
        mock.expect_transmit().times(4).returning(|_| Ok(()));
        let relay = FrameRelay::new(Box::new(mock));
        let other = relay.clone();

        // Act: two "sessions" forwarding concurrently
        let a = tokio::spawn({
            let relay = relay.clone();
            async move {
                relay.forward(DmxFrame::new()).await.unwrap();
                relay.forward(DmxFrame::new()).await.unwrap();
            }
        });
        let b = tokio::spawn(async move {
            other.forward(DmxFrame::new()).await.unwrap();
            other.forward(DmxFrame::new()).await.unwrap();
        });
        a.await.unwrap();
        b.await.unwrap();

        // Assert
        assert_eq!(relay.frames_forwarded(), 4);
    }
}

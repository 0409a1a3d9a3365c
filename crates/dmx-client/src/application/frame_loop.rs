//! The frame loop: send, wait for the acknowledgment, advance, repeat.
//!
//! The loop owns no connection state of its own.  It borrows a
//! [`FrameConnection`], so the one-exchange-in-flight rule of the transport
//! carries over unchanged.  The loop stops when:
//!
//! - `max_frames` frames have been acknowledged,
//! - the shared `running` flag is cleared (e.g. by a Ctrl+C handler), or
//! - an exchange fails.  The failure is returned; nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};

use dmx_core::{Ack, DmxFrame, FrameError, CHANNEL_COUNT};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::infrastructure::transport::{FrameConnection, TransportError};

/// Produces the next frame from the current one.
pub trait FrameStep {
    /// Mutates `frame` in place into the next frame to send.
    fn advance(&mut self, frame: &mut DmxFrame);
}

impl<F> FrameStep for F
where
    F: FnMut(&mut DmxFrame),
{
    fn advance(&mut self, frame: &mut DmxFrame) {
        self(frame)
    }
}

/// Moves a set of channels up by one and another set down by one per frame,
/// wrapping at the ends of the 0–255 range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRamp {
    rising: Vec<usize>,
    falling: Vec<usize>,
}

impl ChannelRamp {
    /// Builds a ramp from 1-based channel numbers.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ChannelOutOfRange`] for the first channel outside
    /// `1..=512`.
    pub fn new(rising: &[usize], falling: &[usize]) -> Result<Self, FrameError> {
        Ok(Self {
            rising: to_indices(rising)?,
            falling: to_indices(falling)?,
        })
    }

    /// `true` when the ramp leaves every frame unchanged.
    pub fn is_empty(&self) -> bool {
        self.rising.is_empty() && self.falling.is_empty()
    }
}

fn to_indices(channels: &[usize]) -> Result<Vec<usize>, FrameError> {
    channels
        .iter()
        .map(|&number| {
            if (1..=CHANNEL_COUNT).contains(&number) {
                Ok(number - 1)
            } else {
                Err(FrameError::ChannelOutOfRange(number))
            }
        })
        .collect()
}

impl FrameStep for ChannelRamp {
    fn advance(&mut self, frame: &mut DmxFrame) {
        for &idx in &self.rising {
            frame[idx] = frame[idx].wrapping_add(1);
        }
        for &idx in &self.falling {
            frame[idx] = frame[idx].wrapping_sub(1);
        }
    }
}

/// Summary of a loop that stopped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Frames written and acknowledged.
    pub frames_sent: u64,
    /// Acknowledgment of the last frame, if any frame was sent.
    pub last_ack: Option<Ack>,
}

/// A loop that stopped because an exchange failed.
#[derive(Debug, Error)]
#[error("frame loop stopped after {frames_sent} frames: {source}")]
pub struct LoopError {
    /// Frames acknowledged before the failure.
    pub frames_sent: u64,
    /// The failed exchange.
    #[source]
    pub source: TransportError,
}

/// Sends `frame`, advances it with `step`, and repeats.
///
/// # Errors
///
/// Returns [`LoopError`] wrapping the first [`TransportError`]; the
/// connection is `Closed` at that point.
pub async fn run_frame_loop<S, P>(
    conn: &mut FrameConnection<S>,
    mut frame: DmxFrame,
    step: &mut P,
    max_frames: Option<u64>,
    running: &AtomicBool,
) -> Result<LoopReport, LoopError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: FrameStep + ?Sized,
{
    let mut report = LoopReport {
        frames_sent: 0,
        last_ack: None,
    };

    while running.load(Ordering::Relaxed) {
        if max_frames.is_some_and(|max| report.frames_sent >= max) {
            debug!("frame limit of {} reached", report.frames_sent);
            break;
        }

        let ack = conn.send_frame(&frame).await.map_err(|source| LoopError {
            frames_sent: report.frames_sent,
            source,
        })?;

        report.frames_sent += 1;
        report.last_ack = Some(ack);
        step.advance(&mut frame);
    }

    info!(
        "frame loop finished: {} frames sent to {}",
        report.frames_sent,
        conn.peer()
    );
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

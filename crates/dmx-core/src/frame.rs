//! The DMX512 frame: one complete snapshot of a universe's 512 channel values.
//!
//! # Length invariant
//!
//! A frame is always exactly [`CHANNEL_COUNT`] bytes.  [`DmxFrame`] wraps a
//! fixed-size array, so a value of this type can never be malformed; the only
//! place a wrong length can appear is when converting from a slice or `Vec`,
//! and those conversions return [`FrameError::InvalidLength`].
//!
//! # Channel numbering
//!
//! DMX channels are numbered from 1, but the byte at index 0 carries channel 1.
//! Indexing (`frame[i]`) is 0-based; [`DmxFrame::channel`] and
//! [`DmxFrame::set_channel`] take the 1-based channel number.  No channel has
//! a meaning at this layer.

use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Number of channels (and bytes) in one DMX512 frame.
pub const CHANNEL_COUNT: usize = 512;

/// Errors produced when building or addressing a [`DmxFrame`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The payload is not exactly 512 bytes long.
    #[error("frame must be exactly 512 bytes, got {len}")]
    InvalidLength { len: usize },

    /// A 1-based channel number outside `1..=512`.
    #[error("channel {0} is outside 1..=512")]
    ChannelOutOfRange(usize),
}

/// A fixed-length DMX512 frame.
///
/// # Examples
///
/// ```rust
/// use dmx_core::{DmxFrame, FrameError};
///
/// let mut frame = DmxFrame::new();
/// frame.set_channel(1, 255).unwrap();
/// assert_eq!(frame[0], 255);
///
/// let err = DmxFrame::try_from(&[0u8; 10][..]).unwrap_err();
/// assert_eq!(err, FrameError::InvalidLength { len: 10 });
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DmxFrame {
    channels: [u8; CHANNEL_COUNT],
}

impl DmxFrame {
    /// Creates a frame with every channel at 0.
    pub const fn new() -> Self {
        Self {
            channels: [0; CHANNEL_COUNT],
        }
    }

    /// Wraps an existing channel array.
    pub const fn from_array(channels: [u8; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    /// Returns the frame as the exact bytes that go on the wire.
    pub fn as_bytes(&self) -> &[u8; CHANNEL_COUNT] {
        &self.channels
    }

    /// Returns the channel values as a mutable array.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; CHANNEL_COUNT] {
        &mut self.channels
    }

    /// Consumes the frame and returns its channel array.
    pub fn into_array(self) -> [u8; CHANNEL_COUNT] {
        self.channels
    }

    /// Returns the value of 1-based channel `number`, or `None` if out of range.
    pub fn channel(&self, number: usize) -> Option<u8> {
        number
            .checked_sub(1)
            .and_then(|idx| self.channels.get(idx))
            .copied()
    }

    /// Sets 1-based channel `number` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ChannelOutOfRange`] unless `1 <= number <= 512`.
    pub fn set_channel(&mut self, number: usize, value: u8) -> Result<(), FrameError> {
        let slot = number
            .checked_sub(1)
            .and_then(|idx| self.channels.get_mut(idx))
            .ok_or(FrameError::ChannelOutOfRange(number))?;
        *slot = value;
        Ok(())
    }

    /// Sets every channel to `value`.
    pub fn fill(&mut self, value: u8) {
        self.channels.fill(value);
    }
}

impl Default for DmxFrame {
    fn default() -> Self {
        Self::new()
    }
}

// A derived Debug would print all 512 values; show only the non-zero ones.
impl std::fmt::Debug for DmxFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active: Vec<(usize, u8)> = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(idx, v)| (idx + 1, *v))
            .collect();
        f.debug_struct("DmxFrame").field("active", &active).finish()
    }
}

impl Index<usize> for DmxFrame {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.channels[index]
    }
}

impl IndexMut<usize> for DmxFrame {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.channels[index]
    }
}

impl AsRef<[u8]> for DmxFrame {
    fn as_ref(&self) -> &[u8] {
        &self.channels
    }
}

impl From<[u8; CHANNEL_COUNT]> for DmxFrame {
    fn from(channels: [u8; CHANNEL_COUNT]) -> Self {
        Self::from_array(channels)
    }
}

impl TryFrom<&[u8]> for DmxFrame {
    type Error = FrameError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let channels: [u8; CHANNEL_COUNT] = bytes
            .try_into()
            .map_err(|_| FrameError::InvalidLength { len: bytes.len() })?;
        Ok(Self { channels })
    }
}

impl TryFrom<Vec<u8>> for DmxFrame {
    type Error = FrameError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(bytes.as_slice())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

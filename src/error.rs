//! Error types shared by the reader, container and resampling code.

use thiserror::Error;

/// Result alias used throughout the crate
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur while reading, building or resampling audio
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Channel {channel} out of range for a {channels}-channel source")]
    ChannelOutOfRange { channel: u16, channels: u16 },

    #[error("Unsupported channel layout: {0} channels (only mono and stereo are supported)")]
    UnsupportedChannelLayout(u16),

    #[error("Unsupported sample width: {0} bytes (only 16-bit PCM is supported)")]
    UnsupportedSampleWidth(u16),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid chunk duration: {0} seconds")]
    InvalidChunkDuration(f64),

    #[error("Invalid segment {start}..{end} for {len} samples")]
    InvalidSegment { start: usize, end: usize, len: usize },

    #[error("Resampling failed: {0}")]
    ResampleFailed(String),

    #[error("Failed to read container: {0}")]
    ContainerReadFailed(String),
}

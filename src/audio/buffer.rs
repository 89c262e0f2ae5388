//! Owned mono sample buffer with header metadata
//!
//! An [`Audio`] lives in one of two modes:
//!
//! - **materialized**: `samples` holds the data and `sample_count` always
//!   equals `samples.len()`. Every mutation goes through [`Audio::set_samples`],
//!   so the two can never drift apart.
//! - **header-only**: built by [`Audio::probe_header`] from container metadata.
//!   No samples are loaded and `sample_count` is the frame count the container
//!   declared, which is provisional. Calling `set_samples` (directly or through
//!   `clear`/`extend`) switches the value to materialized mode.

use std::fmt;

use super::resample::{resample_audio_with, FftResampler, Resampler};
use crate::error::{AudioError, AudioResult};

/// Sample rate used when none is given
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Bytes per sample (16-bit signed PCM)
pub const SAMPLE_WIDTH: u16 = 2;

/// Header metadata as reported by a container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub channel_number: u16,
    pub sample_width: u16,
}

/// A half-open range of sample indices attached to an [`Audio`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
///
/// Only built through [`Audio::push_segment`], so `start <= end` always holds.
pub struct Segment {
    start: usize,
    end: usize,
}

impl Segment {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Mono 16-bit audio buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Audio {
    sample_rate: u32,
    channel_number: u16,
    sample_width: u16,
    samples: Vec<i16>,
    sample_count: usize,
    header_only: bool,
    segments: Vec<Segment>,
}

impl Default for Audio {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channel_number: 1,
            sample_width: SAMPLE_WIDTH,
            samples: Vec::new(),
            sample_count: 0,
            header_only: false,
            segments: Vec::new(),
        }
    }
}

impl Audio {
    /// Create a materialized buffer from mono samples
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }

        let mut audio = Self {
            sample_rate,
            ..Self::default()
        };
        audio.set_samples(samples);
        Ok(audio)
    }

    /// Create an empty buffer at the given sample rate
    pub fn with_rate(sample_rate: u32) -> AudioResult<Self> {
        Self::from_samples(Vec::new(), sample_rate)
    }

    /// Create a header-only value from container metadata
    ///
    /// `sample_count` reports the declared frame count until samples are set.
    pub fn probe_header(header: AudioHeader) -> AudioResult<Self> {
        if header.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(header.sample_rate));
        }

        Ok(Self {
            sample_rate: header.sample_rate,
            channel_number: header.channel_number,
            sample_width: header.sample_width,
            samples: Vec::new(),
            sample_count: header.sample_count,
            header_only: true,
            segments: Vec::new(),
        })
    }

    /// Replace the sample buffer and recompute the sample count
    pub fn set_samples(&mut self, samples: Vec<i16>) {
        self.sample_count = samples.len();
        self.samples = samples;
        self.header_only = false;
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.set_samples(Vec::new());
    }

    /// Append another buffer, resampling it to this buffer's rate if needed
    pub fn extend(&mut self, other: &Audio) -> AudioResult<()> {
        self.extend_with(other, &FftResampler::default())
    }

    /// Like [`Audio::extend`] with an explicit resampler
    pub fn extend_with<R>(&mut self, other: &Audio, resampler: &R) -> AudioResult<()>
    where
        R: Resampler + ?Sized,
    {
        let source = resample_audio_with(other, self.sample_rate, resampler)?;

        let mut samples = std::mem::take(&mut self.samples);
        samples.extend_from_slice(source.samples());
        self.set_samples(samples);
        Ok(())
    }

    /// Attach an annotation range; `end` may not exceed the sample count
    pub fn push_segment(&mut self, start: usize, end: usize) -> AudioResult<()> {
        if start > end || end > self.sample_count {
            return Err(AudioError::InvalidSegment {
                start,
                end,
                len: self.sample_count,
            });
        }
        self.segments.push(Segment { start, end });
        Ok(())
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_number(&self) -> u16 {
        self.channel_number
    }

    pub fn sample_width(&self) -> u16 {
        self.sample_width
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of samples (declared frame count for header-only values)
    pub fn len(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Whether this value only carries container metadata
    pub fn is_header_only(&self) -> bool {
        self.header_only
    }
}

impl fmt::Display for Audio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Audio sample rate: {}, samples: {}, second: {} > ",
            self.sample_rate,
            self.sample_count,
            self.duration()
        )
    }
}

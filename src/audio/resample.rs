//! Sample rate conversion
//!
//! The conversion itself sits behind the [`Resampler`] trait so callers can
//! swap the DSP. [`FftResampler`] is the default and uses rubato.

use std::borrow::Cow;

use rubato::{FftFixedIn, Resampler as _};

use super::buffer::Audio;
use crate::error::{AudioError, AudioResult};

/// Default number of input frames rubato processes per call
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Smallest chunk size handed to rubato
pub const MIN_CHUNK_SIZE: usize = 16;

/// Extra flush calls allowed beyond the estimate before giving up
const FLUSH_SLACK_CALLS: usize = 64;

/// Converts mono 16-bit samples between sample rates
pub trait Resampler: Send + Sync {
    /// Resample `samples` from `from_rate` to `to_rate`
    ///
    /// Must not have side effects and must be deterministic for a given input.
    fn resample(&self, samples: &[i16], from_rate: u32, to_rate: u32) -> AudioResult<Vec<i16>>;
}

/// FFT based resampler backed by rubato
#[derive(Debug, Clone, Copy)]
pub struct FftResampler {
    chunk_size: usize,
    sub_chunks: usize,
}

impl Default for FftResampler {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sub_chunks: 2,
        }
    }
}

impl FftResampler {
    /// Create a resampler processing `chunk_size` input frames at a time
    ///
    /// Sizes below [`MIN_CHUNK_SIZE`] are raised to it.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(MIN_CHUNK_SIZE),
            ..Self::default()
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Resampler for FftResampler {
    fn resample(&self, samples: &[i16], from_rate: u32, to_rate: u32) -> AudioResult<Vec<i16>> {
        if from_rate == 0 {
            return Err(AudioError::InvalidSampleRate(from_rate));
        }
        if to_rate == 0 {
            return Err(AudioError::InvalidSampleRate(to_rate));
        }
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        if from_rate == to_rate {
            return Ok(samples.to_vec());
        }

        let mut resampler = FftFixedIn::<f64>::new(
            from_rate as usize,
            to_rate as usize,
            self.chunk_size,
            self.sub_chunks,
            1,
        )
        .map_err(|e| AudioError::ResampleFailed(format!("Failed to create resampler: {}", e)))?;

        let input: Vec<f64> = samples.iter().map(|&s| s as f64 / 32768.0).collect();
        let delay = resampler.output_delay();
        let expected = (samples.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;

        let mut output: Vec<f64> = Vec::with_capacity(expected + delay);
        let mut pos = 0;

        // Full chunks
        while input.len() - pos >= resampler.input_frames_next() {
            let end = pos + resampler.input_frames_next();
            let chunk: &[f64] = &input[pos..end];
            let out = resampler
                .process(std::slice::from_ref(&chunk), None)
                .map_err(|e| AudioError::ResampleFailed(e.to_string()))?;
            output.extend_from_slice(&out[0]);
            pos = end;
        }

        // Trailing partial chunk (zero padded by rubato)
        if pos < input.len() {
            let chunk: &[f64] = &input[pos..];
            let out = resampler
                .process_partial(Some(std::slice::from_ref(&chunk)), None)
                .map_err(|e| AudioError::ResampleFailed(e.to_string()))?;
            output.extend_from_slice(&out[0]);
        }

        // Flush the filter delay. Some calls yield no frames, so
        // keep going until enough output exists or the call budget runs out.
        let needed = delay + expected;
        let max_calls = (needed.saturating_sub(output.len()) as u64 * from_rate as u64)
            .div_ceil(to_rate as u64)
            .div_ceil(resampler.input_frames_next().max(1) as u64) as usize
            * 2
            + FLUSH_SLACK_CALLS;
        let mut calls = 0;
        while output.len() < needed {
            if calls == max_calls {
                return Err(AudioError::ResampleFailed(format!(
                    "resampler produced {} of {} frames",
                    output.len().saturating_sub(delay),
                    expected
                )));
            }
            let out = resampler
                .process_partial::<&[f64]>(None, None)
                .map_err(|e| AudioError::ResampleFailed(e.to_string()))?;
            output.extend_from_slice(&out[0]);
            calls += 1;
        }

        log::debug!(
            "Resampled {} samples {} Hz -> {} Hz ({} out)",
            samples.len(),
            from_rate,
            to_rate,
            expected
        );

        Ok(output
            .into_iter()
            .skip(delay)
            .take(expected)
            .map(|x| (x * 32768.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
            .collect())
    }
}

/// Resample `audio` to `target_rate` with the default resampler
pub fn resample_audio(audio: &Audio, target_rate: u32) -> AudioResult<Cow<'_, Audio>> {
    resample_audio_with(audio, target_rate, &FftResampler::default())
}

/// Resample `audio` to `target_rate`
///
/// Returns the input borrowed when the rates already match. Otherwise the
/// result is a new buffer at `target_rate` with default header metadata.
pub fn resample_audio_with<'a, R>(
    audio: &'a Audio,
    target_rate: u32,
    resampler: &R,
) -> AudioResult<Cow<'a, Audio>>
where
    R: Resampler + ?Sized,
{
    if target_rate == 0 {
        return Err(AudioError::InvalidSampleRate(target_rate));
    }
    if audio.sample_rate() == target_rate {
        return Ok(Cow::Borrowed(audio));
    }

    let samples = resampler.resample(audio.samples(), audio.sample_rate(), target_rate)?;
    Ok(Cow::Owned(Audio::from_samples(samples, target_rate)?))
}

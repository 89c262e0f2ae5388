//! Audio module - mono sample buffers, PCM containers and resampling
//!
//! This module provides:
//! - The `Audio` buffer with header metadata
//! - PCM containers (WAV files via symphonia, in-memory bytes)
//! - Whole-file and chunked readers
//! - Sample rate conversion

mod buffer;
mod container;
mod reader;
mod resample;

pub use buffer::{Audio, AudioHeader, Segment, DEFAULT_SAMPLE_RATE, SAMPLE_WIDTH};
pub use container::{PcmBuffer, PcmContainer, WavContainer};
pub use reader::{
    read_audio, read_audio_chunks, read_audio_chunks_file, read_audio_file, ReadOptions,
};
pub use resample::{
    resample_audio, resample_audio_with, FftResampler, Resampler, DEFAULT_CHUNK_SIZE,
    MIN_CHUNK_SIZE,
};

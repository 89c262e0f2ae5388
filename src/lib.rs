//! wavchunk - mono 16-bit PCM buffers for speech pipelines
//!
//! Loads WAV audio into [`Audio`] buffers, either whole or split into
//! fixed-duration chunks, reduces stereo sources to one channel, and
//! reconciles sample rates when buffers are concatenated.

pub mod audio;
pub mod error;
pub mod settings;

pub use audio::{
    read_audio, read_audio_chunks, read_audio_chunks_file, read_audio_file, resample_audio,
    resample_audio_with, Audio, AudioHeader, FftResampler, PcmBuffer, PcmContainer, ReadOptions,
    Resampler, Segment, WavContainer,
};
pub use error::{AudioError, AudioResult};
pub use settings::ReaderSettings;

//! PCM containers
//!
//! A container reports its header and hands out raw frame bytes
//! (little-endian, interleaved 16-bit). [`WavContainer`] decodes files with
//! symphonia; [`PcmBuffer`] serves bytes already in memory.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as SymphoniaSampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AudioError, AudioResult};

/// Frames requested per call by [`PcmContainer::read_to_end`]
const READ_BLOCK_FRAMES: u64 = 1 << 16;

/// Source of interleaved 16-bit PCM frames
pub trait PcmContainer {
    /// Frames per second
    fn sample_rate(&self) -> u32;

    fn channel_count(&self) -> u16;

    /// Bytes per sample
    fn sample_width(&self) -> u16;

    /// Frame count declared by the header; may not match the data
    fn frame_count(&self) -> u64;

    /// Read up to `frames` frames as raw bytes
    ///
    /// Returns fewer bytes at the end of the stream and an empty vector once
    /// it is exhausted.
    fn read_frames(&mut self, frames: u64) -> AudioResult<Vec<u8>>;

    /// Read every remaining frame, ignoring the declared frame count
    fn read_to_end(&mut self) -> AudioResult<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            let block = self.read_frames(READ_BLOCK_FRAMES)?;
            if block.is_empty() {
                break;
            }
            bytes.extend_from_slice(&block);
        }
        Ok(bytes)
    }
}

/// PCM bytes held in memory
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: u16,
    declared_frames: u64,
    bytes: Vec<u8>,
    cursor: usize,
}

impl PcmBuffer {
    /// Wrap raw little-endian interleaved bytes
    pub fn new(sample_rate: u32, channels: u16, bytes: Vec<u8>) -> Self {
        let frame_bytes = 2 * channels.max(1) as usize;
        Self {
            sample_rate,
            channels,
            declared_frames: (bytes.len() / frame_bytes) as u64,
            bytes,
            cursor: 0,
        }
    }

    /// Wrap interleaved samples
    pub fn from_samples(sample_rate: u32, channels: u16, samples: &[i16]) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(sample_rate, channels, bytes)
    }

    /// Override the declared frame count, as an imprecise header would
    pub fn with_declared_frames(mut self, frames: u64) -> Self {
        self.declared_frames = frames;
        self
    }
}

impl PcmContainer for PcmBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_width(&self) -> u16 {
        2
    }

    fn frame_count(&self) -> u64 {
        self.declared_frames
    }

    fn read_frames(&mut self, frames: u64) -> AudioResult<Vec<u8>> {
        let frame_bytes = 2 * self.channels.max(1) as u64;
        let wanted = usize::try_from(frames.saturating_mul(frame_bytes)).unwrap_or(usize::MAX);
        let end = self.cursor.saturating_add(wanted).min(self.bytes.len());
        let block = self.bytes[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(block)
    }
}

/// WAV file decoded through symphonia
///
/// The file handle is owned by the format reader and closed when the
/// container is dropped.
pub struct WavContainer {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    sample_width: u16,
    frame_count: u64,
    /// Decoded bytes not yet handed out
    pending: Vec<u8>,
    finished: bool,
}

impl WavContainer {
    /// Open and probe a WAV file
    pub fn open(path: impl AsRef<Path>) -> AudioResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AudioError::ContainerReadFailed(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::ContainerReadFailed(format!("probe failed: {}", e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::ContainerReadFailed("no audio tracks found".into()))?;

        let codec_params = &track.codec_params;
        let track_id = track.id;
        let sample_rate = codec_params.sample_rate.unwrap_or(0);
        let channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let sample_width = codec_params
            .bits_per_sample
            .or(codec_params.bits_per_coded_sample)
            .map(|bits| bits.div_ceil(8) as u16)
            .unwrap_or(0);
        let frame_count = codec_params.n_frames.unwrap_or(0);

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::ContainerReadFailed(format!("decoder: {}", e)))?;

        log::info!(
            "Opened {:?}: {} Hz, {} channel(s), {} byte samples, {} frames",
            path,
            sample_rate,
            channels,
            sample_width,
            frame_count
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            sample_width,
            frame_count,
            pending: Vec::new(),
            finished: false,
        })
    }

    /// Decode the next packet of our track into `pending`
    ///
    /// Returns false once the stream has ended.
    fn decode_next(&mut self) -> AudioResult<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(e) => return Err(AudioError::ContainerReadFailed(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buf =
                        SymphoniaSampleBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec());
                    buf.copy_interleaved_ref(decoded);
                    self.pending
                        .extend(buf.samples().iter().flat_map(|s| s.to_le_bytes()));
                    return Ok(true);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(AudioError::ContainerReadFailed(e.to_string())),
            }
        }
    }
}

impl PcmContainer for WavContainer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_width(&self) -> u16 {
        self.sample_width
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn read_frames(&mut self, frames: u64) -> AudioResult<Vec<u8>> {
        let frame_bytes = 2 * self.channels.max(1) as u64;
        let wanted = usize::try_from(frames.saturating_mul(frame_bytes)).unwrap_or(usize::MAX);

        while self.pending.len() < wanted && !self.finished {
            if !self.decode_next()? {
                self.finished = true;
            }
        }

        let take = wanted.min(self.pending.len());
        let rest = self.pending.split_off(take);
        Ok(std::mem::replace(&mut self.pending, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_header() {
        let buffer = PcmBuffer::from_samples(8000, 2, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.sample_width(), 2);
        assert_eq!(buffer.frame_count(), 3);
    }

    #[test]
    fn test_buffer_reads_in_frames() {
        let mut buffer = PcmBuffer::from_samples(8000, 2, &[1, 2, 3, 4, 5, 6]);

        assert_eq!(buffer.read_frames(2).unwrap().len(), 8);
        assert_eq!(buffer.read_frames(2).unwrap().len(), 4);
        assert!(buffer.read_frames(2).unwrap().is_empty());
    }

    #[test]
    fn test_read_to_end_ignores_declared_count() {
        let mut buffer = PcmBuffer::from_samples(8000, 1, &[7; 100]).with_declared_frames(10);
        assert_eq!(buffer.frame_count(), 10);
        assert_eq!(buffer.read_to_end().unwrap().len(), 200);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buffer = PcmBuffer::from_samples(8000, 1, &[0x0102, -1]);
        assert_eq!(buffer.read_to_end().unwrap(), vec![0x02, 0x01, 0xff, 0xff]);
    }

    #[test]
    fn test_open_missing_file() {
        let result = WavContainer::open("/nonexistent/definitely/missing.wav");
        assert!(matches!(result, Err(AudioError::ContainerReadFailed(_))));
    }
}

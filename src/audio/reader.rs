//! Reading containers into mono [`Audio`] buffers
//!
//! Both entry points validate the container header before touching any frame
//! data, read the raw byte stream once, and reduce stereo sources to a single
//! channel. The chunked reader cuts the raw bytes into bounded-duration
//! windows before decoding.

use std::path::Path;

use super::buffer::{Audio, AudioHeader, SAMPLE_WIDTH};
use super::container::{PcmContainer, WavContainer};
use crate::error::{AudioError, AudioResult};

/// Options shared by [`read_audio`] and [`read_audio_chunks`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Only load header metadata, no samples
    pub header_only: bool,
    /// Channel kept from a stereo source
    pub channel: u16,
}

impl ReadOptions {
    pub fn header_only() -> Self {
        Self {
            header_only: true,
            ..Self::default()
        }
    }

    pub fn channel(channel: u16) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }
}

/// Read a whole container into a single mono buffer
///
/// When the source is stereo only `options.channel` is kept. Once samples are
/// loaded the sample count is the decoded length, even when the container
/// declared a different frame count.
pub fn read_audio<C>(source: &mut C, options: ReadOptions) -> AudioResult<Audio>
where
    C: PcmContainer + ?Sized,
{
    let channels = validate(source, options.channel)?;

    if options.header_only {
        return Audio::probe_header(header_of(source));
    }

    let bytes = source.read_to_end()?;
    let samples = deinterleave(&bytes, channels, options.channel);

    log::debug!(
        "Read {} samples at {} Hz (header declared {} frames)",
        samples.len(),
        source.sample_rate(),
        source.frame_count()
    );

    Audio::from_samples(samples, source.sample_rate())
}

/// Read a container as a sequence of buffers of at most `chunk_seconds` each
///
/// The trailing chunk is truncated, never dropped. An empty stream yields no
/// chunks. Stereo sources always contribute their first channel here;
/// `options.channel` is validated but not used for extraction.
pub fn read_audio_chunks<C>(
    source: &mut C,
    chunk_seconds: f64,
    options: ReadOptions,
) -> AudioResult<Vec<Audio>>
where
    C: PcmContainer + ?Sized,
{
    if !chunk_seconds.is_finite() || chunk_seconds <= 0.0 {
        return Err(AudioError::InvalidChunkDuration(chunk_seconds));
    }

    let channels = validate(source, options.channel)?;
    if options.channel != 0 {
        log::debug!(
            "Chunked read keeps channel 0, ignoring selector {}",
            options.channel
        );
    }

    let group = frame_group_bytes(channels);
    let target = (chunk_seconds * group as f64 * source.sample_rate() as f64) as usize;
    let target = target - target % group;
    if target == 0 {
        return Err(AudioError::InvalidChunkDuration(chunk_seconds));
    }

    let bytes = source.read_to_end()?;
    let total = bytes.len();
    let header = header_of(source);

    let mut chunks = Vec::with_capacity(total.div_ceil(target));
    let mut cursor = 0;

    while cursor < total {
        let window = target.min(total - cursor);

        let audio = if options.header_only {
            Audio::probe_header(header)?
        } else {
            let samples = deinterleave(&bytes[cursor..cursor + window], channels, 0);
            Audio::from_samples(samples, header.sample_rate)?
        };
        chunks.push(audio);

        cursor += window;
    }

    log::debug!(
        "Split {} bytes into {} chunk(s) of up to {} bytes",
        total,
        chunks.len(),
        target
    );

    Ok(chunks)
}

/// Open a WAV file and read it with [`read_audio`]
pub fn read_audio_file(path: impl AsRef<Path>, options: ReadOptions) -> AudioResult<Audio> {
    let mut container = WavContainer::open(path)?;
    read_audio(&mut container, options)
}

/// Open a WAV file and read it with [`read_audio_chunks`]
pub fn read_audio_chunks_file(
    path: impl AsRef<Path>,
    chunk_seconds: f64,
    options: ReadOptions,
) -> AudioResult<Vec<Audio>> {
    let mut container = WavContainer::open(path)?;
    read_audio_chunks(&mut container, chunk_seconds, options)
}

/// Check the header and return the channel count
fn validate<C>(source: &C, channel: u16) -> AudioResult<u16>
where
    C: PcmContainer + ?Sized,
{
    let channels = source.channel_count();
    if !(1..=2).contains(&channels) {
        return Err(AudioError::UnsupportedChannelLayout(channels));
    }
    if channel >= channels {
        return Err(AudioError::ChannelOutOfRange { channel, channels });
    }
    if source.sample_width() != SAMPLE_WIDTH {
        return Err(AudioError::UnsupportedSampleWidth(source.sample_width()));
    }
    if source.sample_rate() == 0 {
        return Err(AudioError::InvalidSampleRate(0));
    }
    Ok(channels)
}

/// Container header as seen by a mono consumer
fn header_of<C>(source: &C) -> AudioHeader
where
    C: PcmContainer + ?Sized,
{
    AudioHeader {
        sample_rate: source.sample_rate(),
        sample_count: usize::try_from(source.frame_count()).unwrap_or(usize::MAX),
        channel_number: 1,
        sample_width: source.sample_width(),
    }
}

/// Bytes making up one frame
fn frame_group_bytes(channels: u16) -> usize {
    SAMPLE_WIDTH as usize * channels as usize
}

/// Decode little-endian i16 samples, keeping `channel` of a stereo stream
///
/// A dangling half sample at the end is ignored.
fn deinterleave(bytes: &[u8], channels: u16, channel: u16) -> Vec<i16> {
    let samples = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]));

    if channels == 2 {
        samples.skip(channel as usize).step_by(2).collect()
    } else {
        samples.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::container::PcmBuffer;

    /// Wraps a container and records whether frames were requested
    struct Tracking {
        inner: PcmBuffer,
        channels: Option<u16>,
        width: Option<u16>,
        reads: usize,
    }

    impl Tracking {
        fn new(inner: PcmBuffer) -> Self {
            Self {
                inner,
                channels: None,
                width: None,
                reads: 0,
            }
        }
    }

    impl PcmContainer for Tracking {
        fn sample_rate(&self) -> u32 {
            self.inner.sample_rate()
        }

        fn channel_count(&self) -> u16 {
            self.channels.unwrap_or(self.inner.channel_count())
        }

        fn sample_width(&self) -> u16 {
            self.width.unwrap_or(self.inner.sample_width())
        }

        fn frame_count(&self) -> u64 {
            self.inner.frame_count()
        }

        fn read_frames(&mut self, frames: u64) -> AudioResult<Vec<u8>> {
            self.reads += 1;
            self.inner.read_frames(frames)
        }
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| i as i16).collect()
    }

    #[test]
    fn test_read_mono() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(100));
        let audio = read_audio(&mut source, ReadOptions::default()).unwrap();

        assert_eq!(audio.len(), 100);
        assert_eq!(audio.samples(), ramp(100).as_slice());
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.channel_number(), 1);
        assert!(!audio.is_header_only());
    }

    #[test]
    fn test_read_stereo_second_channel() {
        let mut source = PcmBuffer::from_samples(8000, 2, &[10, 11, 20, 21, 30, 31]);
        let audio = read_audio(&mut source, ReadOptions::channel(1)).unwrap();

        assert_eq!(audio.samples(), &[11, 21, 31]);
        assert_eq!(audio.channel_number(), 1);
    }

    #[test]
    fn test_read_stereo_first_channel() {
        let mut source = PcmBuffer::from_samples(8000, 2, &[10, 11, 20, 21, 30, 31]);
        let audio = read_audio(&mut source, ReadOptions::default()).unwrap();
        assert_eq!(audio.samples(), &[10, 20, 30]);
    }

    #[test]
    fn test_read_header_only() {
        let mut source = Tracking::new(PcmBuffer::from_samples(16000, 2, &ramp(64)));
        let audio = read_audio(&mut source, ReadOptions::header_only()).unwrap();

        assert!(audio.is_header_only());
        assert!(audio.samples().is_empty());
        assert_eq!(audio.len(), 32);
        assert_eq!(audio.sample_rate(), 16000);
        assert_eq!(audio.channel_number(), 1);
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_decoded_length_wins_over_header() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(50)).with_declared_frames(1_000_000);
        let audio = read_audio(&mut source, ReadOptions::default()).unwrap();
        assert_eq!(audio.len(), 50);
    }

    #[test]
    fn test_channel_out_of_range_fails_before_read() {
        let mut source = Tracking::new(PcmBuffer::from_samples(8000, 1, &ramp(10)));
        let result = read_audio(&mut source, ReadOptions::channel(1));

        assert!(matches!(
            result,
            Err(AudioError::ChannelOutOfRange {
                channel: 1,
                channels: 1
            })
        ));
        assert_eq!(source.reads, 0);

        let result = read_audio_chunks(&mut source, 1.0, ReadOptions::channel(3));
        assert!(matches!(result, Err(AudioError::ChannelOutOfRange { .. })));
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_unsupported_layouts() {
        let mut source = Tracking::new(PcmBuffer::from_samples(8000, 1, &ramp(10)));
        source.channels = Some(6);
        assert!(matches!(
            read_audio(&mut source, ReadOptions::default()),
            Err(AudioError::UnsupportedChannelLayout(6))
        ));

        source.channels = None;
        source.width = Some(3);
        assert!(matches!(
            read_audio(&mut source, ReadOptions::default()),
            Err(AudioError::UnsupportedSampleWidth(3))
        ));
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_zero_rate_container() {
        let mut source = PcmBuffer::from_samples(0, 1, &ramp(10));
        assert!(matches!(
            read_audio(&mut source, ReadOptions::default()),
            Err(AudioError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_chunks_empty_stream() {
        let mut source = PcmBuffer::from_samples(8000, 1, &[]);
        let chunks = read_audio_chunks(&mut source, 1.0, ReadOptions::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunks_even_split() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(8000));
        let chunks = read_audio_chunks(&mut source, 0.5, ReadOptions::default()).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4000);
        assert_eq!(chunks[1].len(), 4000);
        assert_eq!(chunks[1].samples()[0], 4000);
    }

    #[test]
    fn test_chunks_truncated_tail() {
        let mut source = PcmBuffer::from_samples(8000, 1, &vec![1; 12000]);
        let chunks = read_audio_chunks(&mut source, 1.0, ReadOptions::default()).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 8000);
        assert_eq!(chunks[1].len(), 4000);
        assert_eq!(chunks[1].duration(), 0.5);
    }

    #[test]
    fn test_single_short_chunk() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(10));
        let chunks = read_audio_chunks(&mut source, 2.0, ReadOptions::default()).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn test_chunks_stereo_keep_first_channel() {
        // 1 second of stereo at 8 Hz: left = i, right = -i
        let interleaved: Vec<i16> = (0..8).flat_map(|i| [i, -i]).collect();
        let mut source = PcmBuffer::from_samples(8, 2, &interleaved);

        let chunks = read_audio_chunks(&mut source, 0.5, ReadOptions::channel(1)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples(), &[0, 1, 2, 3]);
        assert_eq!(chunks[1].samples(), &[4, 5, 6, 7]);
        assert!(chunks.iter().all(|c| c.channel_number() == 1));
    }

    #[test]
    fn test_chunks_header_only() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(12000));
        let chunks = read_audio_chunks(&mut source, 1.0, ReadOptions::header_only()).unwrap();

        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.is_header_only());
            assert!(chunk.samples().is_empty());
            assert_eq!(chunk.len(), 12000);
        }
    }

    #[test]
    fn test_chunks_invalid_duration() {
        let mut source = PcmBuffer::from_samples(8000, 1, &ramp(100));
        for seconds in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                read_audio_chunks(&mut source, seconds, ReadOptions::default()),
                Err(AudioError::InvalidChunkDuration(_))
            ));
        }

        // smaller than one frame
        let mut source = PcmBuffer::from_samples(8, 1, &ramp(100));
        assert!(read_audio_chunks(&mut source, 0.01, ReadOptions::default()).is_err());
    }

    #[test]
    fn test_chunk_windows_stay_frame_aligned() {
        // 0.5 s * 4 bytes * 6 Hz = 12 bytes = 3 frames
        let interleaved: Vec<i16> = (0..10).flat_map(|i| [i, 100 + i]).collect();
        let mut source = PcmBuffer::from_samples(6, 2, &interleaved);
        let chunks = read_audio_chunks(&mut source, 0.5, ReadOptions::default()).unwrap();

        let lens: Vec<usize> = chunks.iter().map(Audio::len).collect();
        assert_eq!(lens, vec![3, 3, 3, 1]);
        assert_eq!(chunks[3].samples(), &[9]);
    }

    #[test]
    fn test_dangling_byte_ignored() {
        let mut source = PcmBuffer::new(8000, 1, vec![1, 0, 2, 0, 9]);
        let audio = read_audio(&mut source, ReadOptions::default()).unwrap();
        assert_eq!(audio.samples(), &[1, 2]);
    }
}

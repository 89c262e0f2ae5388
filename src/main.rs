//! wavchunk - probe a WAV file the way a recognition pipeline would load it
//!
//! Usage: `wavchunk <file.wav> [chunk_seconds]`
//!
//! Reads the file in chunks using the persisted settings, resamples each
//! chunk to the configured target rate and merges them into one buffer.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wavchunk::{read_audio_chunks_file, resample_audio_with, Audio, AudioResult, ReaderSettings};

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting wavchunk");

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: wavchunk <file.wav> [chunk_seconds]");
        return ExitCode::FAILURE;
    };

    let mut settings = ReaderSettings::load_or_create();
    if let Some(seconds) = args.next() {
        match seconds.parse() {
            Ok(seconds) => settings.chunk_seconds = seconds,
            Err(e) => {
                eprintln!("invalid chunk duration {:?}: {}", seconds, e);
                return ExitCode::FAILURE;
            }
        }
    }

    match run(&path, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {}", path.display(), e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path, settings: &ReaderSettings) -> AudioResult<()> {
    let chunks = read_audio_chunks_file(path, settings.chunk_seconds, settings.read_options())?;
    let resampler = settings.resampler();

    let mut merged: Option<Audio> = None;
    for (i, chunk) in chunks.iter().enumerate() {
        println!("chunk {}: {}", i, chunk);

        if chunk.is_header_only() {
            continue;
        }

        let chunk = match settings.target_sample_rate {
            Some(rate) => resample_audio_with(chunk, rate, &resampler)?.into_owned(),
            None => chunk.clone(),
        };
        match merged.as_mut() {
            Some(audio) => audio.extend_with(&chunk, &resampler)?,
            None => merged = Some(chunk),
        }
    }

    if let Some(audio) = merged {
        println!("merged: {}", audio);
    }

    Ok(())
}

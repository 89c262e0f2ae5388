use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{FftResampler, ReadOptions, DEFAULT_CHUNK_SIZE};

/// Returns the path to the settings file: `~/.config/wavchunk/settings.json`
pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("wavchunk");
    path.push("settings.json");
    path
}

/// Persisted reader settings.
///
/// Serialized as JSON to the platform config directory.
/// Fields use `#[serde(default)]` so that adding new settings
/// won't break existing config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    // Reading
    pub chunk_seconds: f64,
    pub channel: u16,
    pub header_only: bool,

    // Resampling
    pub target_sample_rate: Option<u32>,
    pub resampler_chunk_size: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            chunk_seconds: 10.0,
            channel: 0,
            header_only: false,

            target_sample_rate: Some(16000),
            resampler_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReaderSettings {
    /// Load settings from the default location, writing defaults on first run.
    pub fn load_or_create() -> Self {
        Self::load_or_create_at(&settings_path())
    }

    /// Load settings from `path`; if no file exists yet, save the defaults there.
    pub fn load_or_create_at(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            log::info!("Writing default settings to {}", path.display());
            settings.save_to(path);
            return settings;
        }
        Self::load_from(path)
    }

    /// Load settings from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to `path` as pretty JSON.
    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!("Failed to write settings: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
            }
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            header_only: self.header_only,
            channel: self.channel,
        }
    }

    pub fn resampler(&self) -> FftResampler {
        FftResampler::new(self.resampler_chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("wavchunk-settings-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: ReaderSettings = serde_json::from_str(r#"{ "channel": 1 }"#).unwrap();
        assert_eq!(settings.channel, 1);
        assert_eq!(settings.chunk_seconds, 10.0);
        assert_eq!(settings.target_sample_rate, Some(16000));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let settings = ReaderSettings {
            chunk_seconds: 2.5,
            header_only: true,
            target_sample_rate: None,
            ..ReaderSettings::default()
        };
        settings.save_to(&path);

        assert_eq!(ReaderSettings::load_from(&path), settings);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_bad_file_falls_back() {
        let path = temp_path("garbage");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(ReaderSettings::load_from(&path), ReaderSettings::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let path = temp_path("first-run");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());

        assert_eq!(ReaderSettings::load_or_create_at(&path), ReaderSettings::default());
        assert!(path.exists());

        // an existing file is read, not overwritten
        let custom = ReaderSettings {
            chunk_seconds: 3.0,
            ..ReaderSettings::default()
        };
        custom.save_to(&path);
        assert_eq!(ReaderSettings::load_or_create_at(&path), custom);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_read_options() {
        let settings = ReaderSettings {
            channel: 1,
            header_only: true,
            ..ReaderSettings::default()
        };
        let options = settings.read_options();
        assert!(options.header_only);
        assert_eq!(options.channel, 1);
        assert_eq!(settings.resampler().chunk_size(), DEFAULT_CHUNK_SIZE);
    }
}

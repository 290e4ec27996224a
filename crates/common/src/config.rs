//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Segment render defaults.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Parameters handed to the segment renderer and assembler at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Silence before narration starts (seconds).
    pub padding_start_secs: f64,

    /// Silence after narration ends (seconds).
    pub padding_end_secs: f64,

    /// Background music gain when a chapter does not set its own.
    pub music_volume: f64,

    /// Video encoder passed to `-c:v`.
    pub video_codec: String,

    /// Audio encoder passed to `-c:a`.
    pub audio_codec: String,

    /// Constant rate factor.
    pub crf: u8,

    /// Encoder speed preset.
    pub preset: String,

    /// Audio bitrate (e.g. "192k").
    pub audio_bitrate: String,

    /// Upper bound on concurrent encoder processes.
    pub max_parallel_renders: usize,

    /// Per-invocation timeout; `None` waits forever.
    pub render_timeout_secs: Option<u64>,

    /// Probe every clip before concatenation and reject mixed stream layouts.
    pub verify_uniform_streams: bool,

    /// Explicit ffmpeg binary; looked up on PATH when unset.
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary; looked up on PATH when unset.
    pub ffprobe_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "longform=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            padding_start_secs: 0.5,
            padding_end_secs: 0.5,
            music_volume: 0.15,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            max_parallel_renders: 1,
            render_timeout_secs: Some(3600),
            verify_uniform_streams: true,
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderDefaults {
    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<(), crate::LongformError> {
        if !self.padding_start_secs.is_finite() || self.padding_start_secs < 0.0 {
            return Err(crate::LongformError::config(format!(
                "padding_start_secs must be >= 0, got {}",
                self.padding_start_secs
            )));
        }
        if !self.padding_end_secs.is_finite() || self.padding_end_secs < 0.0 {
            return Err(crate::LongformError::config(format!(
                "padding_end_secs must be >= 0, got {}",
                self.padding_end_secs
            )));
        }
        if !self.music_volume.is_finite() || self.music_volume < 0.0 {
            return Err(crate::LongformError::config(format!(
                "music_volume must be >= 0, got {}",
                self.music_volume
            )));
        }
        if self.crf > 51 {
            return Err(crate::LongformError::config(format!(
                "crf must be in 0..=51, got {}",
                self.crf
            )));
        }
        Ok(())
    }

    /// Worker count, never zero.
    pub fn worker_count(&self) -> usize {
        self.max_parallel_renders.max(1)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit file, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("longform").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults_match_reference_values() {
        let defaults = RenderDefaults::default();
        assert_eq!(defaults.padding_start_secs, 0.5);
        assert_eq!(defaults.padding_end_secs, 0.5);
        assert_eq!(defaults.music_volume, 0.15);
        assert_eq!(defaults.crf, 23);
        assert_eq!(defaults.preset, "medium");
        assert_eq!(defaults.worker_count(), 1);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"render":{"padding_end_secs":1.25}}"#).unwrap();
        assert_eq!(parsed.render.padding_end_secs, 1.25);
        assert_eq!(parsed.render.padding_start_secs, 0.5);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_negative_padding() {
        let defaults = RenderDefaults {
            padding_start_secs: -0.1,
            ..Default::default()
        };
        assert!(defaults.validate().is_err());
        assert!(RenderDefaults::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_means_one() {
        let defaults = RenderDefaults {
            max_parallel_renders: 0,
            ..Default::default()
        };
        assert_eq!(defaults.worker_count(), 1);
    }

    #[test]
    fn test_load_from_invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("longform_test_bad_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.render, RenderDefaults::default());
        std::fs::remove_file(&path).ok();
    }
}

//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CutlineError, CutlineResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Playback and editing tolerances.
    pub playback: PlaybackConfig,

    /// Ruler / track view layout.
    pub ruler: RulerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Tolerances used by the playback core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Divergence (seconds) between expected and reported resource time
    /// above which the resource is repositioned.
    pub drift_threshold_secs: f64,

    /// Minimum active length of a segment after trimming.
    pub min_segment_secs: f64,

    /// Gain assigned to newly added audio layers, in `[0, 100]`.
    pub default_layer_gain: f64,

    /// Step used by skip forward/backward.
    pub skip_secs: f64,
}

/// Ruler rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerConfig {
    /// Width of the track view in pixels.
    pub viewport_width_px: f64,

    /// Scale used when the timeline is empty.
    pub fallback_pixels_per_second: f64,

    /// Spacing between ruler ticks.
    pub tick_interval_secs: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cutline_playback=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            drift_threshold_secs: 0.5,
            min_segment_secs: 0.1,
            default_layer_gain: 80.0,
            skip_secs: 5.0,
        }
    }
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            viewport_width_px: 800.0,
            fallback_pixels_per_second: 100.0,
            tick_interval_secs: 5.0,
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

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> CutlineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            CutlineError::config(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Save config to the standard location.
    pub fn save(&self) -> CutlineResult<()> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cutline").join("config.json")
}

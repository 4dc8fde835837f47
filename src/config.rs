//! Configuration management for detection and playback tuning
//!
//! This module provides runtime configuration loading from JSON files, so the
//! sampling budget and motion thresholds of the phase detector can be adjusted
//! without recompiling. User preferences that the comparison path needs (the
//! default target preset per mode) live here too and are passed down
//! explicitly rather than read from global state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::{preset_by_id, TempoMode, TempoPreset};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Phase detection sampling and heuristic parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Lower bound on sampled frames, even for very short clips
    pub min_samples: usize,
    /// Hard upper bound on sampled frames, independent of duration and fps
    pub max_samples: usize,
    /// Desired spacing between samples before the bounds are applied
    pub min_sample_interval_ms: u64,
    /// Extraction requests allowed in flight at once
    pub max_concurrent_extractions: usize,
    /// Fewer successful samples than this falls back to the template estimate
    pub min_viable_samples: usize,
    /// Fraction of the (peak - baseline) motion range that marks takeaway
    pub onset_fraction: f64,
    /// Clip length assumed when the extractor cannot report a duration
    pub fallback_duration_ms: u64,
    /// Width of the luma thumbnails the extractor produces
    pub thumbnail_width: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_samples: 8,
            max_samples: 32,
            min_sample_interval_ms: 50,
            max_concurrent_extractions: 4,
            min_viable_samples: 3,
            // The downswing peak sits far above the first backswing motion
            onset_fraction: 0.02,
            fallback_duration_ms: 3000,
            thumbnail_width: 96,
        }
    }
}

/// Playback session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Speed applied when a video is opened
    pub default_speed: f32,
    /// Buffered frame-change notifications per subscriber
    pub frame_channel_capacity: usize,
    /// Buffered caller commands awaiting the session task
    pub command_channel_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            frame_channel_capacity: 64,
            command_channel_capacity: 32,
        }
    }
}

/// Tempo comparison preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Training mode selected when the caller does not specify one
    pub default_mode: TempoMode,
    /// Target preset id used for the long (3:1) mode
    pub long_target_preset: String,
    /// Target preset id used for the short (2:1) mode
    pub short_target_preset: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_mode: TempoMode::Long,
            long_target_preset: "long-24-8".to_string(),
            short_target_preset: "short-18-9".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Preset id configured as the target for `mode`
    pub fn target_preset_id(&self, mode: TempoMode) -> &str {
        match mode {
            TempoMode::Long => &self.long_target_preset,
            TempoMode::Short => &self.short_target_preset,
        }
    }

    /// Configured target preset for `mode`, if the id names a preset of that mode
    pub fn target_preset(&self, mode: TempoMode) -> Option<&'static TempoPreset> {
        preset_by_id(self.target_preset_id(mode)).filter(|preset| preset.mode() == mode)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults (with a logged warning) when
    /// the file is missing or its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/tempo_config.json")
    }
}

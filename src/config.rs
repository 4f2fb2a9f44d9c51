//! Configuration management for coaching parameters
//!
//! Runtime configuration is loaded from a JSON file so sampling cadence,
//! cue timing and report settings can be tuned without recompiling.
//! Missing sections fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "assets/coach_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub comparison: ComparisonConfig,
    pub voice: VoiceConfig,
    pub moments: MomentsConfig,
    pub broadcast: BroadcastConfig,
}

/// Live comparison loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Polling period of the comparison loop
    pub poll_interval_ms: u64,
    /// Keep one comparison in the session log per this many ticks
    pub sample_every_n_ticks: u32,
    /// Worst-segment score below which captions point at a missing posecode
    pub caption_threshold: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            sample_every_n_ticks: 3,
            caption_threshold: 70.0,
        }
    }
}

/// Spoken cue timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub enabled: bool,
    /// Minimum gap between any two utterances
    pub cooldown_ms: u64,
    /// Minimum gap before repeating the same segment, or praising again
    pub repeat_ms: u64,
    /// Worst-segment score below which a correction is spoken
    pub flag_threshold: f64,
    /// Overall score at or above which praise is spoken
    pub praise_threshold: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ms: 4000,
            repeat_ms: 8000,
            flag_threshold: 55.0,
            praise_threshold: 85.0,
        }
    }
}

/// Worst-moment search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentsConfig {
    pub window_seconds: f64,
    pub count: usize,
}

impl Default for MomentsConfig {
    fn default() -> Self {
        Self {
            window_seconds: 3.0,
            count: 3,
        }
    }
}

/// Broadcast channel capacities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub comparison_capacity: usize,
    pub cue_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            comparison_capacity: 100,
            cue_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Falls back to defaults (with a warning) when the file is missing or
    /// the JSON is invalid.
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

    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }
}

//! # Configuration Module
//!
//! Runtime parameters for capture, estimation and display, loaded from a
//! JSON file so thresholds can be tuned without recompiling. Missing or
//! malformed files fall back to the reference defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Default file looked up by [`TunerConfig::load`].
pub const CONFIG_FILE: &str = "tuner_config.json";

/// Complete tuner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Samples per analysis window (even, 2048 by default).
    pub buffer_size: usize,
    /// Sample rate requested from the input device in Hz.
    pub target_sample_rate: u32,
    /// RMS below which a window counts as silence.
    pub silence_threshold: f32,
    /// Normalized correlation a lag must exceed to be a pitch candidate.
    pub correlation_threshold: f32,
    /// Interval between tuning loop ticks in milliseconds (~60 Hz).
    pub tick_interval_ms: u64,
    /// Indicator displacement per cent of detune, in pixels.
    pub indicator_px_per_cent: f32,
    /// Frames buffered between the audio callback and the tuning loop.
    pub capture_queue: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2048,
            target_sample_rate: 44_100,
            silence_threshold: 0.01,
            correlation_threshold: 0.9,
            tick_interval_ms: 16,
            indicator_px_per_cent: 2.0,
            capture_queue: 4,
        }
    }
}

impl TunerConfig {
    /// Load configuration from a JSON file.
    ///
    /// Fields absent from the file keep their defaults. An unreadable,
    /// unparsable or invalid file yields the default configuration.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!(
                    "[CONFIG] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                return Self::default();
            }
        };

        match Self::from_json(&contents) {
            Ok(config) => {
                log::info!("[CONFIG] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!(
                    "[CONFIG] Rejected config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load `tuner_config.json` from the working directory.
    pub fn load() -> Self {
        Self::load_from_file(CONFIG_FILE)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: TunerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 || self.buffer_size % 2 != 0 {
            return Err(ConfigError::BufferSize(self.buffer_size));
        }
        let positive = [
            ("target_sample_rate", self.target_sample_rate as f64),
            ("silence_threshold", self.silence_threshold as f64),
            ("correlation_threshold", self.correlation_threshold as f64),
            ("tick_interval_ms", self.tick_interval_ms as f64),
            ("capture_queue", self.capture_queue as f64),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        Ok(())
    }
}

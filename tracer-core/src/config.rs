//! # Configuration Module
//!
//! Session-wide settings with JSON persistence. Every field has a default,
//! so partial files load cleanly; out-of-range values are clamped on load.

use crate::classify::{DEFAULT_TOLERANCE_CENTS, DEFAULT_UNSTABLE_AFTER_FRAMES, clamp_tolerance};
use crate::pitch::EstimatorConfig;
use crate::reference::ReferenceConfig;
use crate::sequence::SequenceConfig;
use crate::smoothing::DEFAULT_SMOOTHING_FACTOR;
use crate::trace::DEFAULT_TRACE_CAPACITY;
use crate::view_range::ViewConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// In-tune window in cents, kept within [5, 80].
    pub tolerance_cents: i32,
    /// Blend weight of each new estimate in the smoothed pitch.
    pub smoothing_factor: f32,
    /// Pitchless frames tolerated before reporting sustained silence.
    pub unstable_after_frames: u32,
    /// Entries kept per trace buffer.
    pub trace_capacity: usize,
    pub estimator: EstimatorConfig,
    pub view: ViewConfig,
    pub reference: ReferenceConfig,
    pub sequence: SequenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tolerance_cents: DEFAULT_TOLERANCE_CENTS,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            unstable_after_frames: DEFAULT_UNSTABLE_AFTER_FRAMES,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            estimator: EstimatorConfig::default(),
            view: ViewConfig::default(),
            reference: ReferenceConfig::default(),
            sequence: SequenceConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Brings every field into its valid range.
    pub fn normalized(mut self) -> Self {
        self.tolerance_cents = clamp_tolerance(self.tolerance_cents);
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            log::warn!(
                "[CONFIG] smoothing_factor {} out of range, using {}",
                self.smoothing_factor,
                DEFAULT_SMOOTHING_FACTOR
            );
            self.smoothing_factor = DEFAULT_SMOOTHING_FACTOR;
        }
        self.trace_capacity = self.trace_capacity.max(1);
        self
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SessionConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("[CONFIG] Loaded {}", path.display());
        Ok(config.normalized())
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config {}", path.display()))?;
        log::info!("[CONFIG] Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracer.json");

        let mut config = SessionConfig::default();
        config.tolerance_cents = 40;
        config.reference.delay_ms = 120.0;
        config.save(&path).unwrap();

        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "tolerance_cents": 10, "view": { "relax_rate": 0.5 } }"#).unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.tolerance_cents, 10);
        assert_eq!(config.view.relax_rate, 0.5);
        assert_eq!(config.view.floor_hz, 40.0);
        assert_eq!(config.estimator, EstimatorConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wild.json");
        fs::write(&path, r#"{ "tolerance_cents": 500, "smoothing_factor": -1.0, "trace_capacity": 0 }"#).unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.tolerance_cents, 80);
        assert_eq!(config.smoothing_factor, DEFAULT_SMOOTHING_FACTOR);
        assert_eq!(config.trace_capacity, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}

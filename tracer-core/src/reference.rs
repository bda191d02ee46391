//! # Reference Sync Module
//!
//! A reference tone is heard only after the output latency has passed. The
//! history here records what was scheduled and when, and answers "what is
//! audible now" by looking a fixed delay into the past.
//!
//! Timestamps are plain milliseconds supplied by the caller, so the buffer
//! runs the same against a wall clock or simulated time.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Timestamp in milliseconds.
pub type Millis = f64;

/// Tunable parameters of the reference history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Playback latency applied when querying.
    pub delay_ms: Millis,
    /// How long entries are kept.
    pub retention_ms: Millis,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            delay_ms: 90.0,
            retention_ms: 5000.0,
        }
    }
}

/// One scheduled reference value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub timestamp: Millis,
    pub frequency: Option<f32>,
}

/// Time-ordered history of scheduled reference frequencies.
#[derive(Debug, Clone, Default)]
pub struct ReferenceHistory {
    config: ReferenceConfig,
    samples: VecDeque<ReferenceSample>,
}

impl ReferenceHistory {
    pub fn new(config: ReferenceConfig) -> Self {
        Self {
            config,
            samples: VecDeque::new(),
        }
    }

    /// Appends a sample and drops entries outside the retention window.
    ///
    /// An entry is dropped only once the entry after it is also older than
    /// the window, so at least one entry always survives as a fallback.
    pub fn push(&mut self, now: Millis, frequency: Option<f32>) {
        self.samples.push_back(ReferenceSample { timestamp: now, frequency });

        let cutoff = now - self.config.retention_ms;
        while self.samples.len() > 1 && self.samples[1].timestamp < cutoff {
            self.samples.pop_front();
        }
    }

    /// The reference frequency audible at `now`, using the configured delay.
    pub fn sync(&self, now: Millis) -> Option<f32> {
        self.sync_with_delay(now, self.config.delay_ms)
    }

    /// The newest entry at or before `now - delay`; falls back to the oldest
    /// retained entry when every entry is newer.
    pub fn sync_with_delay(&self, now: Millis, delay: Millis) -> Option<f32> {
        let audible_at = now - delay;
        self.samples
            .iter()
            .rev()
            .find(|s| s.timestamp <= audible_at)
            .or_else(|| self.samples.front())
            .and_then(|s| s.frequency)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &ReferenceSample> {
        self.samples.iter()
    }

    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }
}

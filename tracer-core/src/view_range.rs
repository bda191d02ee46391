//! # Adaptive View Range Module
//!
//! Keeps a logarithmic frequency window sized around the current targets.
//! The window snaps to its ideal on first use and afterwards relaxes towards
//! it a fixed fraction per call, so target changes glide instead of jumping.

use crate::tuning::{frequency_to_note, semitone_ratio};
use serde::{Deserialize, Serialize};

/// Smallest allowed `max / min` ratio.
const MIN_RANGE_RATIO: f32 = 1.01;

/// Tunable parameters of the range estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Padding added below the lowest and above the highest target.
    pub pad_semitones: f32,
    /// Narrowest window allowed.
    pub min_span_semitones: f32,
    /// Fraction of the remaining distance covered per call.
    pub relax_rate: f32,
    /// Absolute lower bound in Hz.
    pub floor_hz: f32,
    /// Absolute upper bound in Hz.
    pub ceiling_hz: f32,
    /// Window used when there are no targets.
    pub default_min: f32,
    pub default_max: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            pad_semitones: 3.0,
            min_span_semitones: 9.0,
            relax_rate: 0.2,
            floor_hz: 40.0,
            ceiling_hz: 2200.0,
            default_min: 70.0,
            default_max: 1100.0,
        }
    }
}

/// A frequency window in Hz. `max > min` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRange {
    pub min: f32,
    pub max: f32,
}

impl ViewRange {
    /// Normalised log position of `freq` in the window, 0 at `min` and 1 at
    /// `max`. Frequencies outside the window are clamped to its edges.
    pub fn position(&self, freq: f32) -> f32 {
        let clamped = freq.clamp(self.min, self.max);
        let log_min = self.min.log2();
        let log_max = self.max.log2();
        (clamped.log2() - log_min) / (log_max - log_min)
    }

    /// Names of the notes nearest to the window edges, low then high.
    pub fn labels(&self) -> (String, String) {
        let name = |f: f32| frequency_to_note(f).map(|n| n.name).unwrap_or_default();
        (name(self.min), name(self.max))
    }

    /// Width of the window in semitones.
    pub fn span_semitones(&self) -> f32 {
        12.0 * (self.max / self.min).log2()
    }

    /// Sum of the absolute edge differences to `other`, in Hz.
    pub fn distance_to(&self, other: &ViewRange) -> f32 {
        (self.min - other.min).abs() + (self.max - other.max).abs()
    }
}

/// Computes the ideal window for a target set.
///
/// 1. Empty set: the configured default window.
/// 2. Otherwise min/max of the targets, padded by `pad_semitones`.
/// 3. Windows narrower than `min_span_semitones` are widened symmetrically
///    around their geometric centre.
/// 4. Both edges are clamped to `[floor_hz, ceiling_hz]` and `max` kept at
///    least 1% above `min`.
pub fn ideal_range(targets: &[f32], config: &ViewConfig) -> ViewRange {
    let (mut min, mut max) = if targets.is_empty() {
        (config.default_min, config.default_max)
    } else {
        let low = targets.iter().copied().fold(f32::INFINITY, f32::min);
        let high = targets.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let pad = semitone_ratio(config.pad_semitones);
        (low / pad, high * pad)
    };

    let min_span = semitone_ratio(config.min_span_semitones);
    if max / min < min_span {
        let center = (min * max).sqrt();
        let half = min_span.sqrt();
        min = center / half;
        max = center * half;
    }

    clamp_range(min, max, config)
}

fn clamp_range(min: f32, max: f32, config: &ViewConfig) -> ViewRange {
    let floor = config.floor_hz;
    let ceiling = config.ceiling_hz.max(floor * MIN_RANGE_RATIO);

    let mut min = if min.is_finite() { min.clamp(floor, ceiling) } else { floor };
    let mut max = if max.is_finite() { max.clamp(floor, ceiling) } else { ceiling };
    if max < min * MIN_RANGE_RATIO {
        if min * MIN_RANGE_RATIO <= ceiling {
            max = min * MIN_RANGE_RATIO;
        } else {
            max = ceiling;
            min = ceiling / MIN_RANGE_RATIO;
        }
    }
    ViewRange { min, max }
}

/// One relaxation step from `previous` towards the ideal window of `targets`.
///
/// With no previous window the ideal is returned directly.
pub fn compute_view_range(
    targets: &[f32],
    previous: Option<ViewRange>,
    config: &ViewConfig,
) -> ViewRange {
    let ideal = ideal_range(targets, config);
    let Some(view) = previous else {
        return ideal;
    };
    let rate = config.relax_rate.clamp(0.0, 1.0);
    ViewRange {
        min: view.min + (ideal.min - view.min) * rate,
        max: view.max + (ideal.max - view.max) * rate,
    }
}

/// Session-owned view state.
#[derive(Debug, Clone, Default)]
pub struct ViewRangeEstimator {
    config: ViewConfig,
    current: Option<ViewRange>,
}

impl ViewRangeEstimator {
    pub fn new(config: ViewConfig) -> Self {
        Self { config, current: None }
    }

    /// Advances the window one step towards the targets' ideal.
    pub fn update(&mut self, targets: &[f32]) -> ViewRange {
        let next = compute_view_range(targets, self.current, &self.config);
        self.current = Some(next);
        next
    }

    /// Forgets the current window so the next update snaps.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<ViewRange> {
        self.current
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ViewConfig {
        ViewConfig::default()
    }

    #[test]
    fn empty_targets_use_default_window() {
        let range = ideal_range(&[], &config());
        assert_eq!(range, ViewRange { min: 70.0, max: 1100.0 });
    }

    #[test]
    fn single_target_gets_minimum_span() {
        let range = ideal_range(&[440.0], &config());
        assert!((range.span_semitones() - 9.0).abs() < 1e-3);
        // centred geometrically on the target
        assert!(((range.min * range.max).sqrt() - 440.0).abs() < 0.01);
    }

    #[test]
    fn wide_sets_are_padded_by_three_semitones() {
        let targets = [130.81, 261.63];
        let range = ideal_range(&targets, &config());
        let pad = semitone_ratio(3.0);
        assert!((range.min - 130.81 / pad).abs() < 1e-3);
        assert!((range.max - 261.63 * pad).abs() < 1e-3);
    }

    #[test]
    fn clamped_to_absolute_bounds() {
        let range = ideal_range(&[30.0, 3000.0], &config());
        assert_eq!(range, ViewRange { min: 40.0, max: 2200.0 });

        let range = ideal_range(&[5000.0], &config());
        assert!(range.max <= 2200.0);
        assert!(range.max >= range.min * MIN_RANGE_RATIO * 0.9999);

        let range = ideal_range(&[10.0], &config());
        assert_eq!(range.min, 40.0);
        assert!(range.max > range.min);
    }

    #[test]
    fn first_call_snaps_then_relaxes() {
        let mut estimator = ViewRangeEstimator::new(config());
        let first = estimator.update(&[]);
        assert_eq!(first, ViewRange { min: 70.0, max: 1100.0 });

        let ideal = ideal_range(&[440.0], &config());
        let second = estimator.update(&[440.0]);
        assert!((second.min - (70.0 + (ideal.min - 70.0) * 0.2)).abs() < 1e-3);
        assert!((second.max - (1100.0 + (ideal.max - 1100.0) * 0.2)).abs() < 1e-3);
    }

    #[test]
    fn converges_monotonically() {
        let targets = [261.63];
        let ideal = ideal_range(&targets, &config());
        let mut estimator = ViewRangeEstimator::new(config());
        estimator.update(&[]);

        let mut last_error = f32::INFINITY;
        for _ in 0..60 {
            let range = estimator.update(&targets);
            assert!(range.max > range.min);
            let error = range.distance_to(&ideal);
            assert!(error <= last_error);
            last_error = error;
        }
        assert!(last_error < 0.1);
    }

    #[test]
    fn distance_sums_edge_offsets() {
        let a = ViewRange { min: 100.0, max: 400.0 };
        let b = ViewRange { min: 110.0, max: 380.0 };
        assert_eq!(a.distance_to(&b), 30.0);
        assert_eq!(b.distance_to(&a), 30.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn reset_snaps_again() {
        let mut estimator = ViewRangeEstimator::new(config());
        estimator.update(&[]);
        estimator.reset();
        let range = estimator.update(&[440.0]);
        assert_eq!(range, ideal_range(&[440.0], &config()));
    }

    #[test]
    fn log_position() {
        let range = ViewRange { min: 100.0, max: 400.0 };
        assert_eq!(range.position(100.0), 0.0);
        assert_eq!(range.position(400.0), 1.0);
        assert!((range.position(200.0) - 0.5).abs() < 1e-6);
        assert_eq!(range.position(50.0), 0.0);
        assert_eq!(range.position(1000.0), 1.0);
    }

    #[test]
    fn labels_name_the_edges() {
        let range = ViewRange { min: 220.0, max: 880.0 };
        assert_eq!(range.labels(), ("A3".to_string(), "A5".to_string()));
    }
}

//! # Tuning Classification Module
//!
//! Compares a smoothed frequency against its nearest target and decides
//! whether it is in tune, sharp or flat for a tolerance in cents.

use crate::targets::nearest_target;
use crate::tuning::cents_between;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance bounds in cents.
pub const MIN_TOLERANCE_CENTS: i32 = 5;
pub const MAX_TOLERANCE_CENTS: i32 = 80;
pub const DEFAULT_TOLERANCE_CENTS: i32 = 25;

/// Consecutive pitchless frames tolerated before a silence is reported.
pub const DEFAULT_UNSTABLE_AFTER_FRAMES: u32 = 8;

/// Clamps a tolerance into `MIN_TOLERANCE_CENTS..=MAX_TOLERANCE_CENTS`.
pub fn clamp_tolerance(cents: i32) -> i32 {
    cents.clamp(MIN_TOLERANCE_CENTS, MAX_TOLERANCE_CENTS)
}

/// Result of classifying one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// Within tolerance; signed offset in cents.
    InTune { cents: f32 },
    /// Above tolerance; magnitude in cents.
    Sharp { cents: f32 },
    /// Below tolerance; magnitude in cents.
    Flat { cents: f32 },
    /// No target to compare against.
    NoTarget,
    /// No pitch this frame.
    NoPitch,
}

impl Classification {
    pub fn is_in_tune(&self) -> bool {
        matches!(self, Classification::InTune { .. })
    }

    /// Signed deviation from the nearest target, when there is one.
    pub fn signed_cents(&self) -> Option<f32> {
        match *self {
            Classification::InTune { cents } => Some(cents),
            Classification::Sharp { cents } => Some(cents),
            Classification::Flat { cents } => Some(-cents),
            Classification::NoTarget | Classification::NoPitch => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::InTune { cents } => write!(f, "In tune ({cents:+.1}c)"),
            Classification::Sharp { cents } => write!(f, "Sharp by {cents:.1}c"),
            Classification::Flat { cents } => write!(f, "Flat by {cents:.1}c"),
            Classification::NoTarget => write!(f, "No target selected"),
            Classification::NoPitch => write!(f, "--"),
        }
    }
}

/// Classifies a frequency against the nearest entry of a target set.
///
/// # Arguments
/// * `freq` - Smoothed frequency in Hz, `None` when no pitch was found
/// * `targets` - Target frequencies in Hz
/// * `tolerance_cents` - In-tune window, clamped to [5, 80]
///
/// An absent frequency is `NoPitch` even when the target set is empty.
pub fn classify(freq: Option<f32>, targets: &[f32], tolerance_cents: i32) -> Classification {
    let Some(freq) = freq.filter(|f| f.is_finite() && *f > 0.0) else {
        return Classification::NoPitch;
    };
    let Some(target) = nearest_target(freq, targets) else {
        return Classification::NoTarget;
    };

    let tolerance = clamp_tolerance(tolerance_cents) as f32;
    let cents = cents_between(freq, target);
    if cents.abs() <= tolerance {
        Classification::InTune { cents }
    } else if cents > 0.0 {
        Classification::Sharp { cents: cents.abs() }
    } else {
        Classification::Flat { cents: cents.abs() }
    }
}

/// Counts consecutive pitchless frames to tell a dropped frame from silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceTracker {
    muted_frames: u32,
    threshold: u32,
}

impl Default for SilenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UNSTABLE_AFTER_FRAMES)
    }
}

impl SilenceTracker {
    pub fn new(threshold: u32) -> Self {
        Self { muted_frames: 0, threshold }
    }

    /// Records one frame and returns whether the silence is now sustained.
    pub fn observe(&mut self, has_pitch: bool) -> bool {
        if has_pitch {
            self.muted_frames = 0;
        } else {
            self.muted_frames = self.muted_frames.saturating_add(1);
        }
        self.is_unstable()
    }

    /// True after more than `threshold` pitchless frames in a row.
    pub fn is_unstable(&self) -> bool {
        self.muted_frames > self.threshold
    }

    pub fn muted_frames(&self) -> u32 {
        self.muted_frames
    }

    pub fn reset(&mut self) {
        self.muted_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slightly_sharp_is_in_tune() {
        match classify(Some(445.0), &[440.0], 25) {
            Classification::InTune { cents } => assert!((cents - 19.56).abs() < 0.05),
            other => panic!("expected in tune, got {other:?}"),
        }
    }

    #[test]
    fn sharp_and_flat() {
        assert!(matches!(classify(Some(460.0), &[440.0], 25), Classification::Sharp { cents } if cents > 25.0));
        assert!(matches!(classify(Some(420.0), &[440.0], 25), Classification::Flat { cents } if cents > 25.0));
    }

    #[test]
    fn empty_targets_and_missing_pitch() {
        assert_eq!(classify(Some(440.0), &[], 25), Classification::NoTarget);
        assert_eq!(classify(None, &[440.0], 25), Classification::NoPitch);
        assert_eq!(classify(None, &[], 25), Classification::NoPitch);
    }

    #[test]
    fn tolerance_is_clamped() {
        // 19.6 cents sharp: out of tune at the 5c floor even if 1 is asked for
        assert!(matches!(classify(Some(445.0), &[440.0], 1), Classification::Sharp { .. }));
        // 80c ceiling: 97 cents is still sharp with a request of 200
        assert!(matches!(classify(Some(466.0), &[440.0], 200), Classification::Sharp { .. }));
        assert_eq!(clamp_tolerance(3), 5);
        assert_eq!(clamp_tolerance(100), 80);
        assert_eq!(clamp_tolerance(40), 40);
    }

    #[test]
    fn status_text() {
        assert_eq!(Classification::InTune { cents: 1.23 }.to_string(), "In tune (+1.2c)");
        assert_eq!(Classification::InTune { cents: -4.0 }.to_string(), "In tune (-4.0c)");
        assert_eq!(Classification::Sharp { cents: 30.0 }.to_string(), "Sharp by 30.0c");
        assert_eq!(Classification::Flat { cents: 12.34 }.to_string(), "Flat by 12.3c");
        assert_eq!(Classification::NoTarget.to_string(), "No target selected");
    }

    #[test]
    fn signed_cents() {
        assert_eq!(Classification::Flat { cents: 30.0 }.signed_cents(), Some(-30.0));
        assert_eq!(Classification::NoPitch.signed_cents(), None);
    }

    #[test]
    fn silence_becomes_unstable_after_more_than_eight_frames() {
        let mut tracker = SilenceTracker::default();
        for _ in 0..8 {
            assert!(!tracker.observe(false));
        }
        assert!(tracker.observe(false));
        assert!(!tracker.observe(true));
        assert_eq!(tracker.muted_frames(), 0);
    }
}

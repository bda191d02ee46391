/// Default blend weight of a new estimate.
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.22;

/// Exponential smoothing of per-frame pitch estimates.
///
/// A missing estimate clears the filter entirely so nothing carries over a
/// silence; the next estimate is taken as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingFilter {
    factor: f32,
    value: Option<f32>,
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}

impl SmoothingFilter {
    /// `factor` is clamped to (0, 1].
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(f32::EPSILON, 1.0)
        } else {
            DEFAULT_SMOOTHING_FACTOR
        };
        Self { factor, value: None }
    }

    /// Feeds one estimate and returns the smoothed value.
    pub fn update(&mut self, estimate: Option<f32>) -> Option<f32> {
        self.value = match (self.value, estimate) {
            (_, None) => None,
            (None, Some(e)) => Some(e),
            (Some(current), Some(e)) => Some(current * (1.0 - self.factor) + e * self.factor),
        };
        self.value
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

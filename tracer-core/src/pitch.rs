//! # Pitch Detection Module
//!
//! Frame-level fundamental frequency estimation using time-domain
//! autocorrelation, tuned for monophonic voice and instrument input.
//!
//! ## Features
//! - RMS silence gate
//! - Low-amplitude edge trimming before correlation
//! - Parabolic interpolation for sub-sample period accuracy
//! - Register guard band rejecting implausible estimates
//!
//! Every degenerate input (silence, too few samples, no interior peak)
//! degrades to `None` rather than an error.

use crate::error::TracerError;
use serde::{Deserialize, Serialize};

/// Number of samples per analysis frame used by the hosts.
pub const FRAME_SIZE: usize = 2048;

/// Tunable constants of the estimator.
///
/// The silence gate and edge threshold were tuned empirically against
/// typical microphone gain and may need adjusting for other input levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Frames with RMS below this are treated as silence.
    pub silence_rms: f32,
    /// Edge samples at or above this absolute amplitude are trimmed.
    pub clip_threshold: f32,
    /// Lowest frequency reported, in Hz.
    pub min_frequency: f32,
    /// Highest frequency reported, in Hz.
    pub max_frequency: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            silence_rms: 0.01,
            clip_threshold: 0.2,
            min_frequency: 60.0,
            max_frequency: 1400.0,
        }
    }
}

/// A block of mono samples together with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl SampleFrame {
    /// Creates a frame, validating the sample rate and sample values.
    ///
    /// # Returns
    /// * `Err(TracerError::InvalidSampleRate)` - rate is not finite and positive
    /// * `Err(TracerError::InvalidFrame)` - a sample is NaN or infinite
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Result<Self, TracerError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(TracerError::InvalidSampleRate(sample_rate));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(TracerError::InvalidFrame);
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Duration of the frame in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Autocorrelation pitch estimator with a reusable correlation buffer.
///
/// The buffer grows to the largest frame seen and is reused afterwards, so
/// steady-state estimation does not allocate.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    config: EstimatorConfig,
    correlations: Vec<f32>,
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl PitchEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            correlations: Vec::with_capacity(FRAME_SIZE),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates the fundamental frequency of a frame.
    pub fn estimate_frame(&mut self, frame: &SampleFrame) -> Option<f32> {
        self.estimate(frame.samples(), frame.sample_rate())
    }

    /// Estimates the fundamental frequency of a raw sample buffer.
    ///
    /// # Arguments
    /// * `signal` - Mono samples in [-1, 1]
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected frequency in Hz, inside the configured register
    /// * `None` - Silence, too short, no clear period, or out of register
    pub fn estimate(&mut self, signal: &[f32], sample_rate: f32) -> Option<f32> {
        let size = signal.len();
        if size == 0 || !(sample_rate > 0.0) {
            return None;
        }

        // --- Noise gate ---
        if !(rms(signal) >= self.config.silence_rms) {
            return None;
        }

        // --- Trim edges ---
        let (r1, r2) = trim_bounds(signal, self.config.clip_threshold);
        let clipped = &signal[r1..r2];
        let len = clipped.len();
        if len < 2 {
            return None;
        }

        // --- Autocorrelation for every lag ---
        self.correlations.clear();
        self.correlations.extend((0..len).map(|lag| {
            clipped[..len - lag]
                .iter()
                .zip(&clipped[lag..])
                .map(|(a, b)| a * b)
                .sum::<f32>()
        }));
        let corr = &self.correlations;

        // --- Skip the zero-lag falloff ---
        let mut dip = 0;
        while dip < len - 1 && corr[dip] > corr[dip + 1] {
            dip += 1;
        }

        // --- Strongest peak past the falloff, first one wins ties ---
        let mut peak_index = dip;
        for i in dip..len {
            if corr[i] > corr[peak_index] {
                peak_index = i;
            }
        }
        if peak_index == 0 || peak_index >= len - 1 {
            return None;
        }

        // --- Parabolic interpolation ---
        let left = corr[peak_index - 1];
        let center = corr[peak_index];
        let right = corr[peak_index + 1];
        let denominator = left - 2.0 * center + right;
        let shift = if denominator != 0.0 {
            0.5 * (left - right) / denominator
        } else {
            0.0
        };
        let period = peak_index as f32 + shift;

        if !period.is_finite() || period <= 0.0 {
            return None;
        }

        let frequency = sample_rate / period;
        if frequency < self.config.min_frequency || frequency > self.config.max_frequency {
            return None;
        }
        Some(frequency)
    }
}

/// Finds the trimmed segment `[r1, r2)` of a frame.
///
/// `r1` is the first sample in the first half quieter than `threshold`
/// (0 when none is), `r2` the last such sample in the second half
/// (`len - 1` when none is). The middle sample of an odd frame belongs to
/// both halves.
fn trim_bounds(signal: &[f32], threshold: f32) -> (usize, usize) {
    let size = signal.len();
    let half = size.div_ceil(2);

    let r1 = (0..half)
        .find(|&i| signal[i].abs() < threshold)
        .unwrap_or(0);
    let r2 = (1..half)
        .map(|i| size - i)
        .find(|&i| signal[i].abs() < threshold)
        .unwrap_or(size - 1);

    (r1, r2.max(r1))
}

/// One-shot convenience wrapper around [`PitchEstimator`] with default settings.
pub fn estimate_pitch(signal: &[f32], sample_rate: f32) -> Option<f32> {
    PitchEstimator::default().estimate(signal, sample_rate)
}

/// Root-mean-square level of a buffer; 0 for an empty buffer.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

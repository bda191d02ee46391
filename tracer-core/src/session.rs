//! # Session Module
//!
//! Owns every piece of mutable analysis state: smoothed pitch, silence
//! counter, view range, reference history and sequence, both trace buffers
//! and the reference generation counter.
//!
//! Two independent ticks drive a session:
//! - the audio tick, [`Session::process_frame`], once per captured frame
//! - the display tick, [`Session::display_tick`], once per rendered frame
//!
//! Both must run on one thread of control. Hosts that capture and render on
//! different threads serialise access, e.g. through [`crate::worker`].

use crate::classify::{Classification, SilenceTracker, classify, clamp_tolerance};
use crate::config::SessionConfig;
use crate::pitch::{PitchEstimator, SampleFrame};
use crate::reference::{Millis, ReferenceHistory};
use crate::sequence::{ReferenceSequence, ScheduledTone, SequenceState};
use crate::smoothing::SmoothingFilter;
use crate::targets::{TargetSpec, build_targets, nearest_target};
use crate::trace::TraceBuffer;
use crate::tuning::{NoteInfo, cents_between, frequency_to_note};
use crate::view_range::{ViewRange, ViewRangeEstimator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Stopped,
    Listening,
}

/// Outcome of one audio tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Unsmoothed estimate for this frame.
    pub raw_frequency: Option<f32>,
    /// Smoothed frequency, the value everything downstream uses.
    pub frequency: Option<f32>,
    /// Nearest equal temperament note of the smoothed frequency.
    pub note: Option<NoteInfo>,
    pub classification: Classification,
    /// More than the configured number of pitchless frames in a row.
    pub unstable: bool,
}

impl FrameReport {
    /// Human-readable tuning status.
    pub fn status_line(&self) -> String {
        if self.unstable {
            return "No stable pitch detected".to_string();
        }
        self.classification.to_string()
    }
}

/// Outcome of one display tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub time_ms: Millis,
    pub view: ViewRange,
    /// Value appended to the detected-pitch trace.
    pub detected: Option<f32>,
    /// Latency-compensated reference value appended to the reference trace.
    pub reference: Option<f32>,
    /// Reference tones that started since the previous tick.
    pub tones: Vec<ScheduledTone>,
}

/// A drawable point of the detected-pitch trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    /// Position in the trace, 0 being the oldest tick.
    pub index: usize,
    pub frequency: f32,
    pub in_tune: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    target: TargetSpec,
    targets: Vec<f32>,
    tolerance_cents: i32,
    estimator: PitchEstimator,
    smoother: SmoothingFilter,
    silence: SilenceTracker,
    view: ViewRangeEstimator,
    reference: ReferenceHistory,
    sequence: ReferenceSequence,
    pitch_trace: TraceBuffer,
    reference_trace: TraceBuffer,
    generation: u64,
    completed_tones: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let config = config.normalized();
        let target = TargetSpec::default();
        Self {
            targets: build_targets(&target),
            target,
            state: SessionState::Stopped,
            tolerance_cents: config.tolerance_cents,
            estimator: PitchEstimator::new(config.estimator),
            smoother: SmoothingFilter::new(config.smoothing_factor),
            silence: SilenceTracker::new(config.unstable_after_frames),
            view: ViewRangeEstimator::new(config.view),
            reference: ReferenceHistory::new(config.reference),
            sequence: ReferenceSequence::new(config.sequence),
            pitch_trace: TraceBuffer::new(config.trace_capacity),
            reference_trace: TraceBuffer::new(config.trace_capacity),
            generation: 0,
            completed_tones: 0,
            config,
        }
    }

    pub fn with_target(mut self, spec: TargetSpec) -> Self {
        self.set_target(spec);
        self
    }

    /// Starts monitoring with fresh traces, filters and view range.
    pub fn start(&mut self) {
        if self.state == SessionState::Listening {
            return;
        }
        self.reset();
        self.state = SessionState::Listening;
        log::info!("[SESSION] Listening ({} targets)", self.targets.len());
    }

    /// Stops monitoring and cancels any reference playback.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.state = SessionState::Stopped;
        self.smoother.reset();
        self.silence.reset();
        self.stop_reference();
        log::info!("[SESSION] Stopped");
    }

    /// Clears all per-run state. The target and tolerance are kept.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.silence.reset();
        self.view.reset();
        self.reference.clear();
        self.pitch_trace.clear();
        self.reference_trace.clear();
        self.stop_reference();
    }

    /// Replaces the target, recomputing the target set.
    ///
    /// A discontinuous change (mode, tonic, template or preset) makes the
    /// next display tick snap to the new window instead of gliding.
    pub fn set_target(&mut self, spec: TargetSpec) {
        let discontinuous = spec.is_discontinuous_from(&self.target);
        self.targets = build_targets(&spec);
        log::debug!(
            "[SESSION] Target {:?}: {} frequencies{}",
            spec,
            self.targets.len(),
            if discontinuous { ", view reset" } else { "" }
        );
        self.target = spec;
        if discontinuous {
            self.view.reset();
        }
    }

    /// Sets the in-tune window, clamped to [5, 80] cents.
    pub fn set_tolerance(&mut self, cents: i32) {
        self.tolerance_cents = clamp_tolerance(cents);
    }

    /// Audio tick: estimate, smooth and classify one frame.
    ///
    /// Returns `None` while the session is stopped.
    pub fn process_frame(&mut self, frame: &SampleFrame) -> Option<FrameReport> {
        self.process_samples(frame.samples(), frame.sample_rate())
    }

    /// [`Session::process_frame`] for a borrowed sample buffer.
    pub fn process_samples(&mut self, samples: &[f32], sample_rate: f32) -> Option<FrameReport> {
        if self.state != SessionState::Listening {
            return None;
        }

        let raw_frequency = self.estimator.estimate(samples, sample_rate);
        let frequency = self.smoother.update(raw_frequency);
        let unstable = self.silence.observe(frequency.is_some());
        let classification = classify(frequency, &self.targets, self.tolerance_cents);
        let note = frequency.and_then(frequency_to_note);

        log::trace!("[SESSION] raw {raw_frequency:?} smoothed {frequency:?} -> {classification}");

        Some(FrameReport {
            raw_frequency,
            frequency,
            note,
            classification,
            unstable,
        })
    }

    /// Display tick: advances the view range, the reference sequence and
    /// both traces.
    pub fn display_tick(&mut self, now: Millis) -> DisplaySnapshot {
        let view = self.view.update(&self.targets);

        let tones = self.sequence.poll(now);
        self.reference.push(now, self.sequence.current_frequency());
        let reference = self.reference.sync(now);

        let detected = match self.state {
            SessionState::Listening => self.smoother.value(),
            SessionState::Stopped => None,
        };
        self.pitch_trace.push(detected);
        self.reference_trace.push(reference);

        DisplaySnapshot {
            time_ms: now,
            view,
            detected,
            reference,
            tones,
        }
    }

    /// Plays the current target set as a reference sequence starting at `now`.
    ///
    /// Any sequence already running is superseded. Returns the first tone to
    /// render, `None` when there are no targets.
    pub fn start_reference(&mut self, now: Millis) -> Option<ScheduledTone> {
        self.generation += 1;
        self.completed_tones = 0;
        log::info!(
            "[SEQUENCE] Starting generation {} with {} notes",
            self.generation,
            self.targets.len()
        );
        self.sequence.start(self.targets.clone(), now, self.generation)
    }

    /// Cancels reference playback. Completions of tones already handed out
    /// become stale.
    pub fn stop_reference(&mut self) {
        if self.sequence.is_active() {
            log::info!("[SEQUENCE] Cancelling generation {}", self.generation);
        }
        self.generation += 1;
        self.sequence.stop();
    }

    /// Reports that the output collaborator finished rendering a tone.
    ///
    /// Returns `false` and leaves the session untouched when the tone
    /// belongs to a cancelled or superseded generation.
    pub fn tone_finished(&mut self, generation: u64, index: usize) -> bool {
        if generation != self.generation {
            log::debug!(
                "[SEQUENCE] Ignoring stale completion of tone {index} (generation {generation}, current {})",
                self.generation
            );
            return false;
        }
        self.completed_tones += 1;
        if self.sequence.state() == SequenceState::Done && self.completed_tones >= self.sequence.len() {
            log::info!("[SEQUENCE] Generation {generation} fully played");
        }
        true
    }

    /// The detected-pitch trace as drawable points, gaps omitted, each
    /// flagged in tune against its nearest target.
    pub fn trace_points(&self) -> Vec<TracePoint> {
        let tolerance = self.tolerance_cents as f32;
        self.pitch_trace
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let frequency = value?;
                let in_tune = nearest_target(frequency, &self.targets)
                    .is_some_and(|target| cents_between(frequency, target).abs() <= tolerance);
                Some(TracePoint { index, frequency, in_tune })
            })
            .collect()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    pub fn tolerance_cents(&self) -> i32 {
        self.tolerance_cents
    }

    pub fn smoothed_frequency(&self) -> Option<f32> {
        self.smoother.value()
    }

    pub fn view_range(&self) -> Option<ViewRange> {
        self.view.current()
    }

    pub fn pitch_trace(&self) -> &TraceBuffer {
        &self.pitch_trace
    }

    pub fn reference_trace(&self) -> &TraceBuffer {
        &self.reference_trace
    }

    pub fn reference_history(&self) -> &ReferenceHistory {
        &self.reference
    }

    pub fn sequence_state(&self) -> SequenceState {
        self.sequence.state()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn completed_tones(&self) -> usize {
        self.completed_tones
    }
}

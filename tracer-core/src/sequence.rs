//! # Reference Sequence Module
//!
//! Plays a list of reference frequencies one after another as an explicit
//! state machine:
//!
//! ```text
//! Idle -> PlayingNote(0) -> Gap(0) -> PlayingNote(1) -> ... -> Gap(n-1) -> Done
//! ```
//!
//! The machine never waits on a timer. The caller advances it with
//! [`ReferenceSequence::poll`] and a timestamp, and it hands back the tones
//! the output collaborator should render. Each tone carries the generation
//! it was scheduled under so late completions can be recognised as stale.

use crate::reference::Millis;
use serde::{Deserialize, Serialize};

/// Gain envelope of a reference tone: linear attack, sustain, linear release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneEnvelope {
    pub peak_gain: f32,
    pub attack_ms: Millis,
    pub release_ms: Millis,
}

impl Default for ToneEnvelope {
    fn default() -> Self {
        Self {
            peak_gain: 0.2,
            attack_ms: 15.0,
            release_ms: 60.0,
        }
    }
}

impl ToneEnvelope {
    /// Gain at `t` milliseconds into a tone lasting `duration` milliseconds.
    pub fn gain_at(&self, t: Millis, duration: Millis) -> f32 {
        if !(0.0..=duration).contains(&t) {
            return 0.0;
        }
        let attack = if self.attack_ms > 0.0 { (t / self.attack_ms).min(1.0) } else { 1.0 };
        let release = if self.release_ms > 0.0 {
            ((duration - t) / self.release_ms).min(1.0)
        } else {
            1.0
        };
        self.peak_gain * attack.min(release).max(0.0) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// How long each note sounds.
    pub note_ms: Millis,
    /// Silence between notes.
    pub gap_ms: Millis,
    pub envelope: ToneEnvelope,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            note_ms: 700.0,
            gap_ms: 150.0,
            envelope: ToneEnvelope::default(),
        }
    }
}

/// A tone handed to the audio output collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTone {
    pub generation: u64,
    /// Position of the note in the sequence.
    pub index: usize,
    pub frequency: f32,
    pub start_ms: Millis,
    pub duration_ms: Millis,
    pub envelope: ToneEnvelope,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceState {
    Idle,
    PlayingNote { index: usize, since: Millis },
    Gap { index: usize, since: Millis },
    Done,
}

/// State machine sequencing reference tones.
#[derive(Debug, Clone)]
pub struct ReferenceSequence {
    config: SequenceConfig,
    notes: Vec<f32>,
    state: SequenceState,
    generation: u64,
}

impl Default for ReferenceSequence {
    fn default() -> Self {
        Self::new(SequenceConfig::default())
    }
}

impl ReferenceSequence {
    pub fn new(config: SequenceConfig) -> Self {
        Self {
            config,
            notes: Vec::new(),
            state: SequenceState::Idle,
            generation: 0,
        }
    }

    /// Starts playing `notes` at `now` under `generation`.
    ///
    /// Returns the first tone, or `None` (and goes straight to `Done`) when
    /// there is nothing to play.
    pub fn start(&mut self, notes: Vec<f32>, now: Millis, generation: u64) -> Option<ScheduledTone> {
        self.notes = notes;
        self.generation = generation;
        if self.notes.is_empty() {
            self.state = SequenceState::Done;
            return None;
        }
        self.state = SequenceState::PlayingNote { index: 0, since: now };
        Some(self.tone(0, now))
    }

    /// Abandons the sequence.
    pub fn stop(&mut self) {
        self.state = SequenceState::Idle;
        self.notes.clear();
    }

    /// Advances through every transition due by `now` and returns the tones
    /// that started along the way.
    pub fn poll(&mut self, now: Millis) -> Vec<ScheduledTone> {
        let mut started = Vec::new();
        loop {
            match self.state {
                SequenceState::PlayingNote { index, since } if now >= since + self.config.note_ms => {
                    self.state = SequenceState::Gap {
                        index,
                        since: since + self.config.note_ms,
                    };
                }
                SequenceState::Gap { index, since } if now >= since + self.config.gap_ms => {
                    let next = index + 1;
                    let at = since + self.config.gap_ms;
                    if next < self.notes.len() {
                        self.state = SequenceState::PlayingNote { index: next, since: at };
                        started.push(self.tone(next, at));
                    } else {
                        log::debug!("[SEQUENCE] generation {} finished", self.generation);
                        self.state = SequenceState::Done;
                    }
                }
                _ => break,
            }
        }
        started
    }

    /// The frequency being scheduled right now, `None` in gaps and when idle.
    pub fn current_frequency(&self) -> Option<f32> {
        match self.state {
            SequenceState::PlayingNote { index, .. } => self.notes.get(index).copied(),
            _ => None,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SequenceState::PlayingNote { .. } | SequenceState::Gap { .. }
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn tone(&self, index: usize, start_ms: Millis) -> ScheduledTone {
        ScheduledTone {
            generation: self.generation,
            index,
            frequency: self.notes[index],
            start_ms,
            duration_ms: self.config.note_ms,
            envelope: self.config.envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> ReferenceSequence {
        ReferenceSequence::new(SequenceConfig {
            note_ms: 100.0,
            gap_ms: 50.0,
            envelope: ToneEnvelope::default(),
        })
    }

    #[test]
    fn walks_through_notes_and_gaps() {
        let mut seq = sequence();
        let first = seq.start(vec![220.0, 330.0], 0.0, 7).unwrap();
        assert_eq!((first.index, first.frequency, first.generation), (0, 220.0, 7));
        assert_eq!(seq.current_frequency(), Some(220.0));

        assert!(seq.poll(99.0).is_empty());
        assert_eq!(seq.current_frequency(), Some(220.0));

        assert!(seq.poll(100.0).is_empty());
        assert_eq!(seq.state(), SequenceState::Gap { index: 0, since: 100.0 });
        assert_eq!(seq.current_frequency(), None);

        let started = seq.poll(150.0);
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].frequency, 330.0);
        assert_eq!(started[0].start_ms, 150.0);

        seq.poll(250.0);
        assert!(seq.is_active());
        seq.poll(300.0);
        assert_eq!(seq.state(), SequenceState::Done);
        assert!(!seq.is_active());
    }

    #[test]
    fn catches_up_after_a_long_poll_gap() {
        let mut seq = sequence();
        seq.start(vec![220.0, 330.0, 440.0], 0.0, 1);
        let started = seq.poll(320.0);
        assert_eq!(started.iter().map(|t| t.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(started[1].start_ms, 300.0);
        assert_eq!(seq.current_frequency(), Some(440.0));
    }

    #[test]
    fn empty_sequence_is_done_immediately() {
        let mut seq = sequence();
        assert!(seq.start(Vec::new(), 0.0, 1).is_none());
        assert_eq!(seq.state(), SequenceState::Done);
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut seq = sequence();
        seq.start(vec![220.0], 0.0, 1);
        seq.stop();
        assert_eq!(seq.state(), SequenceState::Idle);
        assert!(seq.poll(1000.0).is_empty());
        assert_eq!(seq.current_frequency(), None);
    }

    #[test]
    fn envelope_ramps() {
        let env = ToneEnvelope {
            peak_gain: 1.0,
            attack_ms: 10.0,
            release_ms: 20.0,
        };
        assert_eq!(env.gain_at(0.0, 100.0), 0.0);
        assert!((env.gain_at(5.0, 100.0) - 0.5).abs() < 1e-6);
        assert_eq!(env.gain_at(50.0, 100.0), 1.0);
        assert!((env.gain_at(90.0, 100.0) - 0.5).abs() < 1e-6);
        assert_eq!(env.gain_at(100.0, 100.0), 0.0);
        assert_eq!(env.gain_at(-1.0, 100.0), 0.0);
        assert_eq!(env.gain_at(101.0, 100.0), 0.0);
    }
}

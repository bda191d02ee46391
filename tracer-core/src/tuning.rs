//! # Musical Tuning Module
//!
//! Equal temperament conversions between note names, integer pitch numbers
//! (MIDI numbering, A4 = 69) and frequencies, anchored at A4 = 440 Hz.
//!
//! ## Features
//! - Note name parsing (`C4`, `F#2`, sharps only)
//! - Frequency to nearest note with cent offset
//! - Cent deviation between two frequencies
//! - Selectable note catalogue for single-note targets

use crate::error::TracerError;
use serde::{Deserialize, Serialize};

/// Reference frequency of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Pitch number of A4.
pub const A4_MIDI: i32 = 69;

/// The twelve equal temperament pitch classes, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest and highest octave accepted by [`parse_note`].
pub const MIN_OCTAVE: i32 = -1;
pub const MAX_OCTAVE: i32 = 9;

/// Information about the equal temperament note nearest to a frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteInfo {
    /// Note name, pitch class followed by octave (e.g. "A4", "C#3")
    pub name: String,
    /// Integer pitch number (A4 = 69)
    pub midi: i32,
    /// Signed offset from the nearest note in cents
    pub cents: f32,
    /// Exact frequency of the nearest note in Hz
    pub closest_frequency: f32,
}

/// A parsed note name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Index into [`NOTE_NAMES`]
    pub pitch_class: usize,
    pub octave: i32,
}

impl Note {
    /// Pitch number of this note (C4 = 60).
    pub fn midi(&self) -> i32 {
        self.pitch_class as i32 + (self.octave + 1) * 12
    }

    pub fn frequency(&self) -> f32 {
        midi_to_frequency(self.midi())
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[self.pitch_class], self.octave)
    }
}

impl std::str::FromStr for Note {
    type Err = TracerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_note(s)
    }
}

/// Parses a note name such as "A4" or "C#3".
///
/// The pitch class must be one of [`NOTE_NAMES`] (sharps only, upper case)
/// and the octave a plain integer in `MIN_OCTAVE..=MAX_OCTAVE`.
///
/// # Returns
/// * `Ok(note)` - Parsed note
/// * `Err(TracerError::InvalidNote)` - Any other token shape
pub fn parse_note(name: &str) -> Result<Note, TracerError> {
    let invalid = || TracerError::InvalidNote(name.to_string());

    let class_len = match name.as_bytes().get(1) {
        Some(b'#') => 2,
        _ => 1,
    };
    if name.len() <= class_len || !name.is_char_boundary(class_len) {
        return Err(invalid());
    }
    let (class, octave) = name.split_at(class_len);

    let pitch_class = NOTE_NAMES
        .iter()
        .position(|&n| n == class)
        .ok_or_else(invalid)?;

    let digits = octave.strip_prefix('-').unwrap_or(octave);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // "C04" and "C-0" would not survive a round trip through frequency_to_note
    if digits.starts_with('0') && (digits.len() > 1 || octave.starts_with('-')) {
        return Err(invalid());
    }
    let octave: i32 = octave.parse().map_err(|_| invalid())?;
    if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
        return Err(invalid());
    }

    Ok(Note { pitch_class, octave })
}

/// Converts a note name to its equal temperament frequency.
///
/// Returns `None` for malformed names.
pub fn note_to_frequency(name: &str) -> Option<f32> {
    parse_note(name).ok().map(|note| note.frequency())
}

/// Frequency of an integer pitch number: `440 * 2^((midi - 69) / 12)`.
pub fn midi_to_frequency(midi: i32) -> f32 {
    // f64 keeps A4 and its octaves exact
    (A4_FREQUENCY as f64 * 2.0_f64.powf((midi - A4_MIDI) as f64 / 12.0)) as f32
}

/// Finds the equal temperament note closest to a frequency.
///
/// # Arguments
/// * `freq` - Input frequency in Hz
///
/// # Returns
/// * `Some(info)` - Nearest note name, pitch number, cent offset and exact frequency
/// * `None` - `freq` is not a finite positive number
pub fn frequency_to_note(freq: f32) -> Option<NoteInfo> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }

    let midi = (A4_MIDI as f32 + 12.0 * (freq / A4_FREQUENCY).log2()).round() as i32;
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    let closest_frequency = midi_to_frequency(midi);

    Some(NoteInfo {
        name: format!("{}{}", NOTE_NAMES[pitch_class], octave),
        midi,
        cents: cents_between(freq, closest_frequency),
        closest_frequency,
    })
}

/// Calculates the deviation from a reference frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_between(freq: f32, reference: f32) -> f32 {
    1200.0 * (freq / reference).log2()
}

/// Frequency ratio spanned by a number of semitones.
pub fn semitone_ratio(semitones: f32) -> f32 {
    2.0_f32.powf(semitones / 12.0)
}

/// Lists every note name in the given octaves, ascending.
///
/// This is the option list offered for single-note targets.
pub fn note_choices(octaves: std::ops::RangeInclusive<i32>) -> Vec<String> {
    octaves
        .flat_map(|octave| NOTE_NAMES.iter().map(move |name| format!("{name}{octave}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_the_reference_anchor() {
        assert_eq!(note_to_frequency("A4"), Some(440.0));
        assert_eq!(note_to_frequency("A5"), Some(880.0));
        assert_eq!(note_to_frequency("A3"), Some(220.0));
    }

    #[test]
    fn middle_c() {
        let c4 = note_to_frequency("C4").unwrap();
        assert!((c4 - 261.6256).abs() < 1e-3);
        assert_eq!(parse_note("C4").unwrap().midi(), 60);
    }

    #[test]
    fn every_note_choice_round_trips() {
        for name in note_choices(MIN_OCTAVE..=MAX_OCTAVE) {
            let freq = note_to_frequency(&name).unwrap();
            let info = frequency_to_note(freq).unwrap();
            assert_eq!(info.name, name);
            assert!(info.cents.abs() < 1.0, "{name}: {} cents", info.cents);
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "A", "H4", "Bb3", "a4", "E#4", "A#", "#4", "C+4", "C4.0", "C 4", "C10", "C-2", "A-", "C04", "C-0"] {
            assert!(note_to_frequency(name).is_none(), "accepted {name:?}");
        }
    }

    #[test]
    fn frequency_to_note_reports_signed_cents() {
        let info = frequency_to_note(445.0).unwrap();
        assert_eq!(info.name, "A4");
        assert_eq!(info.midi, 69);
        assert!((info.cents - 19.56).abs() < 0.05);

        let info = frequency_to_note(430.0).unwrap();
        assert_eq!(info.name, "A4");
        assert!(info.cents < 0.0);
    }

    #[test]
    fn low_frequencies_use_floor_for_octave() {
        let info = frequency_to_note(midi_to_frequency(0)).unwrap();
        assert_eq!(info.name, "C-1");
        let info = frequency_to_note(midi_to_frequency(11)).unwrap();
        assert_eq!(info.name, "B-1");
    }

    #[test]
    fn non_positive_frequency_has_no_note() {
        assert!(frequency_to_note(0.0).is_none());
        assert!(frequency_to_note(-10.0).is_none());
        assert!(frequency_to_note(f32::NAN).is_none());
        assert!(frequency_to_note(f32::INFINITY).is_none());
    }

    #[test]
    fn note_choices_cover_twelve_per_octave() {
        let choices = note_choices(2..=6);
        assert_eq!(choices.len(), 60);
        assert_eq!(choices.first().map(String::as_str), Some("C2"));
        assert_eq!(choices.last().map(String::as_str), Some("B6"));
    }
}

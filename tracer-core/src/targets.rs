//! # Target Set Module
//!
//! Turns a musical target (a single note, a tonic plus interval template, or
//! a fixed practice preset) into the ordered list of frequencies the tuner
//! compares against.
//!
//! The interval templates and presets are immutable lookup tables; adding an
//! entry does not touch any other component.

use crate::error::TracerError;
use crate::tuning::{self, midi_to_frequency, parse_note};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semitone offsets from the tonic, each ending at the octave.
const INTERVAL_TEMPLATES: [(&str, &[i32]); 7] = [
    ("major", &[0, 2, 4, 5, 7, 9, 11, 12]),
    ("natural_minor", &[0, 2, 3, 5, 7, 8, 10, 12]),
    ("harmonic_minor", &[0, 2, 3, 5, 7, 8, 11, 12]),
    ("melodic_minor", &[0, 2, 3, 5, 7, 9, 11, 12]),
    ("major_pentatonic", &[0, 2, 4, 7, 9, 12]),
    ("minor_pentatonic", &[0, 3, 5, 7, 10, 12]),
    ("blues", &[0, 3, 5, 6, 7, 10, 12]),
];

/// Two-octave practice scales spelled out note by note.
const PRESET_SCALES: [(&str, &[&str]); 6] = [
    ("C_major", &["C3", "D3", "E3", "F3", "G3", "A3", "B3", "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]),
    ("G_major", &["G2", "A2", "B2", "C3", "D3", "E3", "F#3", "G3", "A3", "B3", "C4", "D4", "E4", "F#4", "G4"]),
    ("D_major", &["D3", "E3", "F#3", "G3", "A3", "B3", "C#4", "D4", "E4", "F#4", "G4", "A4", "B4", "C#5", "D5"]),
    ("A_minor", &["A2", "B2", "C3", "D3", "E3", "F3", "G3", "A3", "B3", "C4", "D4", "E4", "F4", "G4", "A4"]),
    ("E_minor", &["E2", "F#2", "G2", "A2", "B2", "C3", "D3", "E3", "F#3", "G3", "A3", "B3", "C4", "D4", "E4"]),
    ("Pentatonic_C", &["C3", "D3", "E3", "G3", "A3", "C4", "D4", "E4", "G4", "A4", "C5"]),
];

/// Static map for interval template lookups by id.
static TEMPLATE_MAP: Lazy<BTreeMap<&'static str, &'static [i32]>> =
    Lazy::new(|| INTERVAL_TEMPLATES.iter().copied().collect());

/// Static map for preset lookups by name.
static PRESET_MAP: Lazy<BTreeMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| PRESET_SCALES.iter().copied().collect());

/// Looks up an interval template by id (e.g. "major", "blues").
pub fn interval_template(id: &str) -> Option<&'static [i32]> {
    TEMPLATE_MAP.get(id).copied()
}

/// Ids of every registered interval template, sorted.
pub fn template_ids() -> impl Iterator<Item = &'static str> {
    TEMPLATE_MAP.keys().copied()
}

/// Names of every preset scale, sorted.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESET_MAP.keys().copied()
}

/// What the user is aiming for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetSpec {
    /// One note, e.g. "A4".
    Single { note: String },
    /// A tonic note plus an interval template id.
    Scale { tonic: String, template: String },
    /// A named preset scale.
    Preset { name: String },
}

impl Default for TargetSpec {
    fn default() -> Self {
        TargetSpec::Single { note: "A4".to_string() }
    }
}

impl TargetSpec {
    pub fn single(note: impl Into<String>) -> Self {
        TargetSpec::Single { note: note.into() }
    }

    pub fn scale(tonic: impl Into<String>, template: impl Into<String>) -> Self {
        TargetSpec::Scale {
            tonic: tonic.into(),
            template: template.into(),
        }
    }

    pub fn preset(name: impl Into<String>) -> Self {
        TargetSpec::Preset { name: name.into() }
    }

    /// Builds the target frequencies, reporting why a spec is unusable.
    pub fn try_targets(&self) -> Result<Vec<f32>, TracerError> {
        let targets = match self {
            TargetSpec::Single { note } => vec![parse_note(note)?.frequency()],
            TargetSpec::Scale { tonic, template } => {
                let tonic = parse_note(tonic)?.midi();
                let offsets = interval_template(template)
                    .ok_or_else(|| TracerError::UnknownTemplate(template.clone()))?;
                offsets
                    .iter()
                    .map(|offset| midi_to_frequency(tonic + offset))
                    .collect()
            }
            TargetSpec::Preset { name } => {
                let notes = PRESET_MAP
                    .get(name.as_str())
                    .ok_or_else(|| TracerError::UnknownPreset(name.clone()))?;
                notes
                    .iter()
                    .filter_map(|note| tuning::note_to_frequency(note))
                    .collect()
            }
        };

        Ok(targets
            .into_iter()
            .filter(|f| f.is_finite() && *f > 0.0)
            .collect())
    }

    /// Whether switching from `previous` to `self` should snap the view range
    /// instead of gliding: any change of mode, tonic, template or preset.
    /// Moving between single notes is continuous.
    pub fn is_discontinuous_from(&self, previous: &TargetSpec) -> bool {
        match (previous, self) {
            (TargetSpec::Single { .. }, TargetSpec::Single { .. }) => false,
            (a, b) => a != b,
        }
    }
}

/// Builds the ordered target set; empty when the note, template or preset is unknown.
pub fn build_targets(spec: &TargetSpec) -> Vec<f32> {
    match spec.try_targets() {
        Ok(targets) => targets,
        Err(e) => {
            log::debug!("[TARGETS] {e}, using an empty target set");
            Vec::new()
        }
    }
}

/// Finds the target closest to `freq` in Hz.
///
/// Equidistant targets resolve to the one listed first.
pub fn nearest_target(freq: f32, targets: &[f32]) -> Option<f32> {
    let mut iter = targets.iter().copied();
    let first = iter.next()?;
    let mut nearest = first;
    let mut min_distance = (first - freq).abs();
    for target in iter {
        let distance = (target - freq).abs();
        if distance < min_distance {
            min_distance = distance;
            nearest = target;
        }
    }
    Some(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c3_major_spans_one_octave() {
        let targets = build_targets(&TargetSpec::scale("C3", "major"));
        assert_eq!(targets.len(), 8);
        assert!(targets.windows(2).all(|w| w[0] < w[1]));
        assert!((targets[7] / targets[0] - 2.0).abs() < 1e-5);
        assert!((targets[0] - 130.8128).abs() < 1e-3);
    }

    #[test]
    fn every_template_ends_at_the_octave() {
        for id in template_ids() {
            let offsets = interval_template(id).unwrap();
            assert_eq!(offsets.first(), Some(&0), "{id}");
            assert_eq!(offsets.last(), Some(&12), "{id}");
            let targets = build_targets(&TargetSpec::scale("A3", id));
            assert_eq!(targets.len(), offsets.len(), "{id}");
        }
    }

    #[test]
    fn single_note_target() {
        assert_eq!(build_targets(&TargetSpec::single("A4")), vec![440.0]);
        assert!(build_targets(&TargetSpec::single("Bb4")).is_empty());
    }

    #[test]
    fn unusable_specs_give_empty_sets() {
        assert!(build_targets(&TargetSpec::scale("C3", "lydian")).is_empty());
        assert!(build_targets(&TargetSpec::scale("X3", "major")).is_empty());
        assert!(build_targets(&TargetSpec::preset("F_major")).is_empty());
        assert_eq!(
            TargetSpec::scale("C3", "lydian").try_targets(),
            Err(TracerError::UnknownTemplate("lydian".into()))
        );
    }

    #[test]
    fn presets_resolve_every_note() {
        for name in preset_names() {
            let expected = PRESET_MAP[name].len();
            assert_eq!(build_targets(&TargetSpec::preset(name)).len(), expected, "{name}");
        }
        let c_major = build_targets(&TargetSpec::preset("C_major"));
        assert!((c_major[14] / c_major[0] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_target_scans_by_hz_distance() {
        let targets = [220.0, 440.0, 880.0];
        assert_eq!(nearest_target(300.0, &targets), Some(220.0));
        assert_eq!(nearest_target(700.0, &targets), Some(880.0));
        assert_eq!(nearest_target(440.0, &[]), None);
    }

    #[test]
    fn nearest_target_ties_go_to_first() {
        assert_eq!(nearest_target(300.0, &[200.0, 400.0]), Some(200.0));
        assert_eq!(nearest_target(300.0, &[400.0, 200.0]), Some(400.0));
    }

    #[test]
    fn discontinuity_rules() {
        let a4 = TargetSpec::single("A4");
        let b4 = TargetSpec::single("B4");
        let c_major = TargetSpec::scale("C3", "major");
        let d_major = TargetSpec::scale("D3", "major");
        let c_blues = TargetSpec::scale("C3", "blues");

        assert!(!b4.is_discontinuous_from(&a4));
        assert!(c_major.is_discontinuous_from(&a4));
        assert!(d_major.is_discontinuous_from(&c_major));
        assert!(c_blues.is_discontinuous_from(&c_major));
        assert!(!c_major.is_discontinuous_from(&c_major));
    }
}

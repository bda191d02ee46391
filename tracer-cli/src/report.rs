//! Text formatting for the `tracer` output.

use tracer_core::{Classification, FrameReport};

/// Formats one analysed frame as a fixed-width line.
pub fn frame_line(time_ms: f64, report: &FrameReport, reference: Option<f32>) -> String {
    let frequency = report
        .frequency
        .map_or_else(|| "--".to_string(), |f| format!("{f:.1}"));
    let note = report.note.as_ref().map_or_else(
        || "--".to_string(),
        |n| format!("{} ({:+.1}c)", n.name, n.cents),
    );
    let reference = reference.map_or_else(|| "--".to_string(), |f| format!("{f:.1}"));

    format!(
        "{time_ms:>9.1} ms  {frequency:>8} Hz  {note:<14} ref {reference:>7}  {}",
        report.status_line()
    )
}

/// Running totals over an analysis.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Summary {
    pub frames: usize,
    pub voiced: usize,
    pub in_tune: usize,
    pub sharp: usize,
    pub flat: usize,
}

impl Summary {
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        if report.frequency.is_some() {
            self.voiced += 1;
        }
        match report.classification {
            Classification::InTune { .. } => self.in_tune += 1,
            Classification::Sharp { .. } => self.sharp += 1,
            Classification::Flat { .. } => self.flat += 1,
            Classification::NoTarget | Classification::NoPitch => {}
        }
    }

    /// Share of voiced frames that were in tune, in percent.
    pub fn in_tune_percent(&self) -> f32 {
        if self.voiced == 0 {
            return 0.0;
        }
        100.0 * self.in_tune as f32 / self.voiced as f32
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} voiced: {} in tune ({:.0}%), {} sharp, {} flat",
            self.frames,
            self.voiced,
            self.in_tune,
            self.in_tune_percent(),
            self.sharp,
            self.flat
        )
    }
}

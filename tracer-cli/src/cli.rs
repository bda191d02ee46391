//! Command-line argument definitions for the `tracer` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracer_core::TargetSpec;

/// Tracer - offline pitch tracing against musical targets
#[derive(Parser)]
#[command(name = "tracer")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Session configuration file (JSON); defaults are used when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Trace the pitch of a WAV file frame by frame
    Analyze {
        /// Path to the WAV file to analyze
        input: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// In-tune window in cents (clamped to 5..=80)
        #[arg(long)]
        tolerance: Option<i32>,

        /// Samples per analysis frame
        #[arg(long, default_value_t = tracer_core::pitch::FRAME_SIZE)]
        frame_size: usize,

        /// Play the target set as a reference sequence from the start
        #[arg(long)]
        reference: bool,
    },

    /// Print the target frequencies for a note, scale or preset
    Targets {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Convert a note name to Hz, or Hz to the nearest note
    Note {
        /// Note name (e.g. "C#3") or frequency in Hz (e.g. "446.2")
        value: String,
    },

    /// Write the default configuration to a file
    Config {
        /// Destination path
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TargetArgs {
    /// Single target note (default: A4)
    #[arg(long, conflicts_with_all = ["tonic", "preset"])]
    pub note: Option<String>,

    /// Tonic of a generated scale
    #[arg(long, conflicts_with = "preset")]
    pub tonic: Option<String>,

    /// Interval template for --tonic
    #[arg(long, default_value = "major")]
    pub scale: String,

    /// Named preset scale (e.g. C_major, Pentatonic_C)
    #[arg(long)]
    pub preset: Option<String>,
}

impl TargetArgs {
    pub fn to_spec(&self) -> TargetSpec {
        if let Some(preset) = &self.preset {
            TargetSpec::preset(preset.clone())
        } else if let Some(tonic) = &self.tonic {
            TargetSpec::scale(tonic.clone(), self.scale.clone())
        } else if let Some(note) = &self.note {
            TargetSpec::single(note.clone())
        } else {
            TargetSpec::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn target_of(cli: Cli) -> TargetSpec {
        match cli.command {
            Commands::Targets { target } => target.to_spec(),
            _ => panic!("expected targets command"),
        }
    }

    #[test]
    fn target_flags_map_to_specs() {
        assert_eq!(target_of(parse(&["tracer", "targets"])), TargetSpec::single("A4"));
        assert_eq!(target_of(parse(&["tracer", "targets", "--note", "E2"])), TargetSpec::single("E2"));
        assert_eq!(
            target_of(parse(&["tracer", "targets", "--tonic", "D3", "--scale", "blues"])),
            TargetSpec::scale("D3", "blues")
        );
        assert_eq!(
            target_of(parse(&["tracer", "targets", "--tonic", "D3"])),
            TargetSpec::scale("D3", "major")
        );
        assert_eq!(
            target_of(parse(&["tracer", "targets", "--preset", "G_major"])),
            TargetSpec::preset("G_major")
        );
    }

    #[test]
    fn conflicting_targets_are_rejected() {
        assert!(Cli::try_parse_from(["tracer", "targets", "--note", "A4", "--preset", "C_major"]).is_err());
        assert!(Cli::try_parse_from(["tracer", "targets", "--note", "A4", "--tonic", "C3"]).is_err());
    }

    #[test]
    fn analyze_defaults() {
        let cli = parse(&["tracer", "analyze", "take.wav"]);
        match cli.command {
            Commands::Analyze { frame_size, reference, tolerance, .. } => {
                assert_eq!(frame_size, 2048);
                assert!(!reference);
                assert_eq!(tolerance, None);
            }
            _ => panic!("expected analyze command"),
        }
    }
}

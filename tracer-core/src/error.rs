use thiserror::Error;

/// Errors raised by the fallible parsers and constructors of the core.
///
/// The per-frame boundary operations never surface these; they degrade to
/// `None` or an empty target set instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TracerError {
    #[error("invalid note name: {0:?}")]
    InvalidNote(String),

    #[error("unknown interval template: {0:?}")]
    UnknownTemplate(String),

    #[error("unknown preset scale: {0:?}")]
    UnknownPreset(String),

    #[error("sample rate must be a finite positive number, got {0}")]
    InvalidSampleRate(f32),

    #[error("sample frame contains non-finite samples")]
    InvalidFrame,
}

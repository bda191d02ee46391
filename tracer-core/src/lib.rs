// tracer-core/src/lib.rs

//! The core logic for the pitch tracer.
//! This crate is responsible for pitch estimation, tuning classification,
//! target sets, the adaptive display range and reference-tone timing.
//! It is completely headless: it consumes sample frames and timestamps and
//! never talks to an audio device or draws anything.
//!
//! ## Pipeline
//!
//! ```text
//! SampleFrame -> PitchEstimator -> SmoothingFilter -> {classify, ViewRange, traces}
//! ReferenceSequence -> ReferenceHistory (latency offset) -> reference trace
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod pitch;
pub mod reference;
pub mod sequence;
pub mod session;
pub mod smoothing;
pub mod targets;
pub mod trace;
pub mod tuning;
pub mod view_range;
pub mod worker;

pub use classify::{Classification, classify};
pub use config::SessionConfig;
pub use error::TracerError;
pub use pitch::{PitchEstimator, SampleFrame, estimate_pitch};
pub use reference::{Millis, ReferenceHistory};
pub use session::{DisplaySnapshot, FrameReport, Session, SessionState};
pub use targets::{TargetSpec, build_targets, nearest_target};
pub use tuning::{NoteInfo, frequency_to_note, note_to_frequency};
pub use view_range::{ViewRange, compute_view_range};
pub use worker::{AnalysisWorker, WorkerCommand, WorkerEvent};

//! # Tracer - offline pitch tracing host
//!
//! Feeds WAV files through the tracer core as if they were arriving from a
//! capture device, one fixed-size frame per audio tick, and prints the
//! resulting pitch, note and tuning status.
//!
//! ## Architecture
//! - **Main thread**: reads the file, simulates time and prints results
//! - **Analysis thread**: owns the session, see `tracer_core::worker`
//! - **Communication**: crossbeam channels carrying commands and events

mod cli;
mod report;
mod wav;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands, TargetArgs};
use crossbeam_channel::RecvTimeoutError;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracer_core::sequence::ScheduledTone;
use tracer_core::tuning::parse_note;
use tracer_core::{
    AnalysisWorker, DisplaySnapshot, FrameReport, SampleFrame, Session, SessionConfig,
    WorkerCommand, WorkerEvent, frequency_to_note,
};

/// How long to wait for the analysis thread before giving up.
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze {
            input,
            target,
            tolerance,
            frame_size,
            reference,
        } => run_analyze(config, &input, &target, tolerance, frame_size, reference),
        Commands::Targets { target } => run_targets(config, &target),
        Commands::Note { value } => run_note(&value),
        Commands::Config { output } => write_default_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(path),
        None => Ok(SessionConfig::default()),
    }
}

fn run_analyze(
    config: SessionConfig,
    input: &Path,
    target: &TargetArgs,
    tolerance: Option<i32>,
    frame_size: usize,
    reference: bool,
) -> Result<()> {
    if frame_size < 4 {
        return Err(anyhow!("frame size must be at least 4 samples"));
    }
    let (samples, sample_rate) = wav::read_mono(input)?;

    let mut session = Session::new(config).with_target(target.to_spec());
    if let Some(cents) = tolerance {
        session.set_tolerance(cents);
    }
    println!(
        "target {:?}: {} frequencies, tolerance {}c",
        session.target(),
        session.targets().len(),
        session.tolerance_cents()
    );

    let worker = AnalysisWorker::spawn(session)?;
    worker.send(WorkerCommand::Start)?;

    // The first tone, if any, arrives with the first tick's events
    let mut pending_tones: Vec<ScheduledTone> = Vec::new();
    if reference {
        worker.send(WorkerCommand::StartReference { now_ms: 0.0 })?;
    }

    let frame_ms = frame_size as f64 * 1000.0 / sample_rate as f64;
    let mut summary = report::Summary::default();

    // A trailing partial frame is dropped, as a capture device would
    for (index, chunk) in samples.chunks_exact(frame_size).enumerate() {
        let now = index as f64 * frame_ms;
        let frame = SampleFrame::new(chunk.to_vec(), sample_rate as f32)?;
        worker.send(WorkerCommand::Frame(frame))?;
        worker.send(WorkerCommand::Display { now_ms: now })?;

        let (frame_report, snapshot) = collect_tick(&worker, &mut pending_tones)?;

        // Simulated output: a tone completes once its duration has elapsed
        report_finished(&worker, take_finished(&mut pending_tones, now));

        if let Some(frame_report) = frame_report {
            summary.record(&frame_report);
            println!("{}", report::frame_line(now, &frame_report, snapshot.reference));
        }
    }

    // Tones cut off by the end of the input still ran to completion
    report_finished(&worker, std::mem::take(&mut pending_tones));

    let session = worker.shutdown()?;
    println!("{summary}");
    if reference {
        println!("reference tones completed: {}", session.completed_tones());
    }
    Ok(())
}

/// Removes and returns the tones whose duration has elapsed at `now`.
fn take_finished(pending: &mut Vec<ScheduledTone>, now: f64) -> Vec<ScheduledTone> {
    let (finished, playing): (Vec<_>, Vec<_>) = pending
        .drain(..)
        .partition(|tone| tone.start_ms + tone.duration_ms <= now);
    *pending = playing;
    finished
}

fn report_finished(worker: &AnalysisWorker, tones: Vec<ScheduledTone>) {
    for tone in tones {
        let finished = WorkerCommand::ToneFinished {
            generation: tone.generation,
            index: tone.index,
        };
        if let Err(e) = worker.send(finished) {
            log::warn!("[MAIN] {e}");
        }
    }
}

/// Reads events until the display snapshot of the current tick arrives.
fn collect_tick(
    worker: &AnalysisWorker,
    pending_tones: &mut Vec<ScheduledTone>,
) -> Result<(Option<FrameReport>, DisplaySnapshot)> {
    let mut report = None;
    loop {
        match next_event(worker)? {
            WorkerEvent::Frame(r) => report = Some(r),
            WorkerEvent::ToneScheduled(tone) => pending_tones.push(tone),
            WorkerEvent::Display(snapshot) => {
                pending_tones.extend(snapshot.tones.iter().copied());
                return Ok((report, snapshot));
            }
        }
    }
}

fn next_event(worker: &AnalysisWorker) -> Result<WorkerEvent> {
    worker
        .events()
        .recv_timeout(EVENT_TIMEOUT)
        .map_err(|e| match e {
            RecvTimeoutError::Timeout => anyhow!("analysis worker stalled"),
            RecvTimeoutError::Disconnected => anyhow!("analysis worker stopped"),
        })
}

fn run_targets(config: SessionConfig, target: &TargetArgs) -> Result<()> {
    let spec = target.to_spec();
    let targets = spec.try_targets()?;
    for freq in &targets {
        let name = frequency_to_note(*freq).map(|n| n.name).unwrap_or_default();
        println!("{name:<5} {freq:>9.3} Hz");
    }

    let view = tracer_core::view_range::ideal_range(&targets, &config.view);
    let (low, high) = view.labels();
    println!("view {:.1}-{:.1} Hz ({low} to {high})", view.min, view.max);
    Ok(())
}

fn run_note(value: &str) -> Result<()> {
    if let Ok(note) = parse_note(value) {
        println!("{note} = {:.3} Hz (pitch {})", note.frequency(), note.midi());
        return Ok(());
    }

    let freq: f32 = value
        .trim_end_matches("Hz")
        .trim()
        .parse()
        .with_context(|| format!("{value:?} is neither a note name nor a frequency"))?;
    let info = frequency_to_note(freq).ok_or_else(|| anyhow!("frequency must be positive"))?;
    println!(
        "{freq:.3} Hz = {} {:+.1}c (pitch {}, {:.3} Hz)",
        info.name, info.cents, info.midi, info.closest_frequency
    );
    Ok(())
}

fn write_default_config(output: &Path) -> Result<()> {
    SessionConfig::default().save(output)?;
    println!("wrote {}", output.display());
    Ok(())
}

//! # Analysis Worker Module
//!
//! Runs a [`Session`] on a dedicated thread and serialises every access to it
//! through a command queue. Hosts whose capture and rendering run on
//! different threads send frames and display ticks here and read the results
//! back from the event channel.
//!
//! ## Architecture
//! - **Command channel**: frames, display ticks and control messages, processed in order
//! - **Event channel**: frame reports, display snapshots and scheduled tones
//! - **Shutdown channel**: stops the loop; the session is handed back on join

use crate::pitch::SampleFrame;
use crate::reference::Millis;
use crate::sequence::ScheduledTone;
use crate::session::{DisplaySnapshot, FrameReport, Session};
use crate::targets::TargetSpec;
use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Messages accepted by the worker.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Start,
    Stop,
    /// Audio tick.
    Frame(SampleFrame),
    /// Display tick.
    Display { now_ms: Millis },
    SetTarget(TargetSpec),
    SetTolerance(i32),
    StartReference { now_ms: Millis },
    StopReference,
    ToneFinished { generation: u64, index: usize },
}

/// Results produced by the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Frame(FrameReport),
    Display(DisplaySnapshot),
    /// A reference tone to hand to the audio output.
    ToneScheduled(ScheduledTone),
}

/// Handle to the analysis thread.
#[derive(Debug)]
pub struct AnalysisWorker {
    command_tx: Sender<WorkerCommand>,
    event_rx: Receiver<WorkerEvent>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<Session>>,
}

impl AnalysisWorker {
    /// Moves `session` onto a new analysis thread.
    pub fn spawn(session: Session) -> Result<Self> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<WorkerCommand>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = thread::Builder::new()
            .name("tracer-analysis".to_string())
            .spawn(move || run(session, command_rx, event_tx, shutdown_rx))
            .map_err(|e| anyhow!("failed to spawn analysis thread: {e}"))?;

        Ok(Self {
            command_tx,
            event_rx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Queues a command.
    pub fn send(&self, command: WorkerCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| anyhow!("analysis worker has stopped"))
    }

    /// The event channel, for blocking or `select!`-based consumers.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.event_rx
    }

    /// Drains every event available right now.
    pub fn poll_events(&self) -> Vec<WorkerEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Stops the thread after the commands already queued and returns the session.
    pub fn shutdown(mut self) -> Result<Session> {
        self.join()
    }

    fn join(&mut self) -> Result<Session> {
        let handle = self
            .thread_handle
            .take()
            .ok_or_else(|| anyhow!("analysis worker already joined"))?;
        let _ = self.shutdown_tx.try_send(());
        handle
            .join()
            .map_err(|_| anyhow!("analysis thread panicked"))
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            if let Err(e) = self.join() {
                log::warn!("[WORKER] {e}");
            }
        }
    }
}

fn run(
    mut session: Session,
    command_rx: Receiver<WorkerCommand>,
    event_tx: Sender<WorkerEvent>,
    shutdown_rx: Receiver<()>,
) -> Session {
    log::debug!("[WORKER] Analysis thread started");
    loop {
        crossbeam_channel::select! {
            recv(command_rx) -> msg => match msg {
                Ok(command) => {
                    if !handle(&mut session, command, &event_tx) {
                        log::debug!("[WORKER] Event channel closed");
                        break;
                    }
                }
                Err(_) => {
                    log::debug!("[WORKER] Command channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                // Finish what was queued before the shutdown request
                while let Ok(command) = command_rx.try_recv() {
                    if !handle(&mut session, command, &event_tx) {
                        break;
                    }
                }
                log::debug!("[WORKER] Received shutdown signal");
                break;
            },
        }
    }
    log::debug!("[WORKER] Analysis thread finished");
    session
}

/// Applies one command. Returns `false` once nobody listens for events.
fn handle(session: &mut Session, command: WorkerCommand, event_tx: &Sender<WorkerEvent>) -> bool {
    let event = match command {
        WorkerCommand::Start => {
            session.start();
            None
        }
        WorkerCommand::Stop => {
            session.stop();
            None
        }
        WorkerCommand::Frame(frame) => session.process_frame(&frame).map(WorkerEvent::Frame),
        WorkerCommand::Display { now_ms } => {
            Some(WorkerEvent::Display(session.display_tick(now_ms)))
        }
        WorkerCommand::SetTarget(spec) => {
            session.set_target(spec);
            None
        }
        WorkerCommand::SetTolerance(cents) => {
            session.set_tolerance(cents);
            None
        }
        WorkerCommand::StartReference { now_ms } => {
            session.start_reference(now_ms).map(WorkerEvent::ToneScheduled)
        }
        WorkerCommand::StopReference => {
            session.stop_reference();
            None
        }
        WorkerCommand::ToneFinished { generation, index } => {
            session.tone_finished(generation, index);
            None
        }
    };

    match event {
        Some(event) => event_tx.send(event).is_ok(),
        None => true,
    }
}

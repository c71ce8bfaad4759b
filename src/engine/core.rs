// src/engine/core.rs

//! Pure core of the watch loop.
//!
//! Consumes [`WatchEvent`]s one at a time, in arrival order, and returns the
//! commands the async shell should execute. No Tokio, channels, filesystem or
//! processes in here, so the rebuild policy can be tested directly.

use tracing::{debug, info, warn};

use crate::engine::queue::RebuildQueue;
use crate::engine::{BuildId, BuildOutcome, WatchEvent};
use crate::errors::DevtasksError;

/// Command produced by the core, executed by the IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Start a style build in the background.
    StartBuild { build: BuildId },
    /// Stop watching with this error.
    Abort(DevtasksError),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct WatchCore {
    /// Build currently in flight, if any.
    running: Option<BuildId>,
    queue: RebuildQueue,
    next_build: BuildId,
}

impl WatchCore {
    pub fn new(queue_length: usize) -> Self {
        Self {
            running: None,
            queue: RebuildQueue::new(queue_length),
            next_build: 1,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total builds started so far.
    pub fn builds_started(&self) -> u64 {
        self.next_build - 1
    }

    pub fn step(&mut self, event: WatchEvent) -> CoreStep {
        match event {
            WatchEvent::SourceChanged { path } => self.on_source_changed(&path),
            WatchEvent::BuildFinished { build, outcome } => self.on_build_finished(build, outcome),
            WatchEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn on_source_changed(&mut self, path: &str) -> CoreStep {
        if self.running.is_some() {
            self.queue.record(path);
            return CoreStep::continue_with(Vec::new());
        }

        info!(path, "source changed; rebuilding styles");
        CoreStep::continue_with(vec![self.start_build()])
    }

    fn on_build_finished(&mut self, build: BuildId, outcome: BuildOutcome) -> CoreStep {
        if self.running != Some(build) {
            warn!(build, running = ?self.running, "completion for unknown build; ignoring");
            return CoreStep::continue_with(Vec::new());
        }
        self.running = None;

        match outcome {
            BuildOutcome::Completed(report) => {
                debug!(
                    build,
                    compiled = report.compiled.len(),
                    failed = report.failed.len(),
                    "build finished"
                );
                if self.queue.take() {
                    info!("changes arrived during the last build; rebuilding styles");
                    CoreStep::continue_with(vec![self.start_build()])
                } else {
                    CoreStep::continue_with(Vec::new())
                }
            }
            BuildOutcome::Aborted(err) => CoreStep {
                commands: vec![CoreCommand::Abort(err)],
                keep_running: false,
            },
        }
    }

    fn start_build(&mut self) -> CoreCommand {
        let build = self.next_build;
        self.next_build += 1;
        self.running = Some(build);
        CoreCommand::StartBuild { build }
    }
}

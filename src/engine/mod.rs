// src/engine/mod.rs

//! Watch loop engine.
//!
//! - [`core`] is a pure state machine deciding when to start a rebuild.
//! - [`queue`] remembers rebuilds requested while one is in flight.
//! - [`runtime`] is the async shell: it reads [`WatchEvent`]s from a channel,
//!   feeds them to the core, and hands builds to a `BuildBackend`.

use crate::errors::DevtasksError;
use crate::styles::BuildReport;

/// Monotonic id of a build started by the watch loop.
pub type BuildId = u64;

/// How a background build ended.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The batch ran to the end. Individual stylesheets may still have failed.
    Completed(BuildReport),
    /// The batch could not run (compiler missing, output not writable).
    Aborted(DevtasksError),
}

/// What a watch loop did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Rebuilds started by source changes.
    pub builds: u64,
}

/// Events flowing into the watch runtime from the watcher, builds and signals.
#[derive(Debug)]
pub enum WatchEvent {
    /// A stylesheet source was created, modified, renamed or removed.
    /// `path` is relative to the project root.
    SourceChanged { path: String },
    BuildFinished { build: BuildId, outcome: BuildOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, WatchCore};
pub use queue::RebuildQueue;
pub use runtime::WatchRuntime;

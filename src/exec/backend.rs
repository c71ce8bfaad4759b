// src/exec/backend.rs

//! Pluggable build backend for the watch runtime.
//!
//! The runtime talks to a `BuildBackend` instead of the style pipeline
//! directly, so tests can count builds and complete them on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{BuildId, BuildOutcome, WatchEvent};
use crate::errors::Result;
use crate::styles::StylePipeline;

/// Starts style builds for the watch runtime.
///
/// `start_build` must return promptly; the build itself runs in the
/// background and reports back with [`WatchEvent::BuildFinished`].
pub trait BuildBackend: Send {
    fn start_build(
        &mut self,
        build: BuildId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs the real style pipeline on a Tokio task per build.
pub struct PipelineBuildBackend {
    pipeline: Arc<StylePipeline>,
    runtime_tx: mpsc::Sender<WatchEvent>,
}

impl PipelineBuildBackend {
    pub fn new(pipeline: Arc<StylePipeline>, runtime_tx: mpsc::Sender<WatchEvent>) -> Self {
        Self {
            pipeline,
            runtime_tx,
        }
    }
}

impl BuildBackend for PipelineBuildBackend {
    fn start_build(
        &mut self,
        build: BuildId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone so the spawned task does not borrow `self`.
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                debug!(build, "style build started");
                let outcome = match pipeline.run().await {
                    Ok(report) => BuildOutcome::Completed(report),
                    Err(err) => BuildOutcome::Aborted(err),
                };

                if let Err(err) = tx.send(WatchEvent::BuildFinished { build, outcome }).await {
                    warn!(build, "failed to report build completion: {err}");
                }
            });
            Ok(())
        })
    }
}

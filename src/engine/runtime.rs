// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::BuildBackend;

use super::core::WatchCore;
use super::{CoreCommand, WatchEvent, WatchReport};

/// Async shell around [`WatchCore`].
///
/// Reads events one at a time, feeds them to the core and executes the
/// resulting commands. Builds are delegated to a `BuildBackend`.
pub struct WatchRuntime<B: BuildBackend> {
    core: WatchCore,
    event_rx: mpsc::Receiver<WatchEvent>,
    backend: B,
}

impl<B: BuildBackend> fmt::Debug for WatchRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: BuildBackend> WatchRuntime<B> {
    pub fn new(core: WatchCore, event_rx: mpsc::Receiver<WatchEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Main event loop.
    ///
    /// Returns `Ok` on shutdown or when every event sender is gone, and the
    /// build's own error if a build could not run at all.
    pub async fn run(mut self) -> Result<WatchReport> {
        info!("watching for stylesheet changes");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("watch event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "watch runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("watch loop stopping");
                break;
            }
        }

        Ok(WatchReport {
            builds: self.core.builds_started(),
        })
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartBuild { build } => {
                debug!(build, "starting build");
                self.backend.start_build(build).await
            }
            CoreCommand::Abort(err) => Err(err),
        }
    }
}

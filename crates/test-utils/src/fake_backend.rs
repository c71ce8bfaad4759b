use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use devtasks::engine::{BuildId, BuildOutcome, WatchEvent};
use devtasks::errors::Result;
use devtasks::exec::BuildBackend;
use devtasks::styles::BuildReport;
use tokio::sync::mpsc;

/// A fake build backend that:
/// - records the id of every build it was asked to start
/// - reports `BuildFinished(Completed)` right away, unless `manual` is set,
///   in which case the test sends completions itself.
pub struct FakeBuildBackend {
    runtime_tx: mpsc::Sender<WatchEvent>,
    started: Arc<Mutex<Vec<BuildId>>>,
    manual: bool,
}

impl FakeBuildBackend {
    pub fn new(runtime_tx: mpsc::Sender<WatchEvent>, started: Arc<Mutex<Vec<BuildId>>>) -> Self {
        Self {
            runtime_tx,
            started,
            manual: false,
        }
    }

    /// Builds stay "in flight" until the test sends `BuildFinished`.
    pub fn manual(runtime_tx: mpsc::Sender<WatchEvent>, started: Arc<Mutex<Vec<BuildId>>>) -> Self {
        Self {
            runtime_tx,
            started,
            manual: true,
        }
    }
}

impl BuildBackend for FakeBuildBackend {
    fn start_build(
        &mut self,
        build: BuildId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let started = Arc::clone(&self.started);
        let manual = self.manual;

        Box::pin(async move {
            started.lock().unwrap().push(build);
            if !manual {
                tx.send(WatchEvent::BuildFinished {
                    build,
                    outcome: BuildOutcome::Completed(BuildReport::default()),
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

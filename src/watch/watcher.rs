// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::WatchEvent;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::SourcePattern;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    watched: PathBuf,
}

impl WatcherHandle {
    /// Absolute directory being watched.
    pub fn watched_dir(&self) -> &Path {
        &self.watched
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("watched", &self.watched)
            .finish()
    }
}

/// Whether a notify event can change compiled output.
///
/// Access and metadata-only events (permission or mtime touches) are ignored.
pub fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Any => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// Spawn a filesystem watcher over the source pattern's base directory.
///
/// Sends one `WatchEvent::SourceChanged` per notify event that touches at
/// least one path matching `pattern`. Paths are reported relative to `root`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    pattern: SourcePattern,
    runtime_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());
    let watched = root.join(pattern.base_dir());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("devtasks: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("devtasks: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&watched, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", watched.display()))?;

    info!("file watcher started on {:?}", watched);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }

            let matched = event
                .paths
                .iter()
                .filter_map(|path| relative_str(&root, path))
                .find(|rel| pattern.matches(rel));

            let Some(path) = matched else {
                debug!(?event.paths, "change outside source pattern; ignoring");
                continue;
            };

            debug!(%path, kind = ?event.kind, "source change detected");
            if runtime_tx
                .send(WatchEvent::SourceChanged { path })
                .await
                .is_err()
            {
                warn!("watch runtime is gone; stopping watcher loop");
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        watched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    #[test]
    fn content_changes_are_relevant() {
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant(&EventKind::Remove(RemoveKind::File)));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
    }

    #[test]
    fn access_and_metadata_are_ignored() {
        assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
        assert!(!is_relevant(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime
        ))));
        assert!(!is_relevant(&EventKind::Other));
    }
}

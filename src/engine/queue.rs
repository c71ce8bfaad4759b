// src/engine/queue.rs

use tracing::debug;

/// Rebuilds requested while a build is already running.
///
/// Builds never overlap: every change that arrives mid-build is recorded
/// here, and the runtime starts the next build once the current one
/// finishes. At most `max_pending` rebuilds are remembered; further changes
/// coalesce into the last pending one, since a later build reads every
/// source fresh anyway.
#[derive(Debug)]
pub struct RebuildQueue {
    max_pending: usize,
    pending: usize,
    coalesced: usize,
}

impl RebuildQueue {
    /// `max_pending` is clamped to at least 1; a zero-length queue would drop
    /// changes made during a build.
    pub fn new(max_pending: usize) -> Self {
        Self {
            max_pending: max_pending.max(1),
            pending: 0,
            coalesced: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    pub fn len(&self) -> usize {
        self.pending
    }

    /// Number of changes folded into an already pending rebuild so far.
    pub fn coalesced(&self) -> usize {
        self.coalesced
    }

    /// Record a change that arrived while building.
    pub fn record(&mut self, path: &str) {
        if self.pending < self.max_pending {
            self.pending += 1;
            debug!(path, pending = self.pending, "queued rebuild");
        } else {
            self.coalesced += 1;
            debug!(
                path,
                max_pending = self.max_pending,
                "rebuild already queued; coalescing change"
            );
        }
    }

    /// Take one pending rebuild, if any.
    pub fn take(&mut self) -> bool {
        if self.pending > 0 {
            self.pending -= 1;
            true
        } else {
            false
        }
    }
}

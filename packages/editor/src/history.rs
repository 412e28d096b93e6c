//! # Undo/Redo History
//!
//! Linear log of whole-document snapshots.
//!
//! ## Design
//!
//! - The log always holds at least one entry and `index` stays within it
//! - A push after undo discards every entry after the current one
//! - The log keeps the most recent `limit` entries, dropping the oldest
//! - Snapshots are shared (`Arc`), so undo/redo never copy the log

use std::sync::Arc;

use funnel_model::Funnel;
use tracing::debug;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Undo/redo log for one editing session
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Arc<Funnel>>,
    index: usize,
    limit: usize,
}

impl History {
    /// Start a log whose first entry is `initial`
    pub fn new(initial: Funnel) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// Start a log with a custom size bound (at least 1)
    pub fn with_limit(initial: Funnel, limit: usize) -> Self {
        Self {
            entries: vec![Arc::new(initial)],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Record a snapshot as the newest entry
    pub fn push(&mut self, snapshot: Funnel) {
        self.entries.truncate(self.index + 1);
        self.entries.push(Arc::new(snapshot));

        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }

        self.index = self.entries.len() - 1;
        debug!(index = self.index, len = self.entries.len(), "History entry added");
    }

    /// Step back; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<Arc<Funnel>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(Arc::clone(&self.entries[self.index]))
    }

    /// Step forward; `None` at the newest entry
    pub fn redo(&mut self) -> Option<Arc<Funnel>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(Arc::clone(&self.entries[self.index]))
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Drop every entry and restart from `snapshot`
    pub fn reset(&mut self, snapshot: Funnel) {
        self.entries = vec![Arc::new(snapshot)];
        self.index = 0;
    }

    pub fn current(&self) -> &Funnel {
        &self.entries[self.index]
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

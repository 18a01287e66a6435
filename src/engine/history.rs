//! Undo/redo history over session snapshots.
//!
//! Snapshots are owned clones; the stacks never alias the live state or each
//! other. Any fresh push forks the timeline and discards the redoable future.

use serde::{Deserialize, Serialize};

use crate::engine::session::SessionState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    past: Vec<SessionState>,
    future: Vec<SessionState>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    /// Record a snapshot after a mutating operation.
    pub fn push(&mut self, snapshot: SessionState) {
        self.past.push(snapshot);
        self.future.clear();
    }

    /// Step back one snapshot.
    ///
    /// The first snapshot (the post-initialize state) is the floor: with one
    /// or zero entries this is a no-op returning `None`. Otherwise the current
    /// top moves to the redo stack and the new top is returned for restore.
    pub fn undo(&mut self) -> Option<SessionState> {
        if self.past.len() <= 1 {
            return None;
        }
        let current = self.past.pop()?;
        self.future.push(current);
        self.past.last().cloned()
    }

    /// Step forward one snapshot; no-op returning `None` when nothing was
    /// undone since the last push.
    pub fn redo(&mut self) -> Option<SessionState> {
        let snapshot = self.future.pop()?;
        self.past.push(snapshot.clone());
        Some(snapshot)
    }

    /// Drop both stacks. Initialize and fast-forward reset history instead of
    /// pushing onto it.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.past.len()
    }
}

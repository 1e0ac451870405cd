//! Pending-toggle tracking.
//!
//! A habit id is pending while a completion toggle for it has been queued
//! but not yet confirmed by the server. Consumers gate the complete and
//! uncomplete affordances on [`PendingSet::is_pending`]. Purely in-memory.

use std::collections::HashSet;

use habit_sync_types::HabitId;

/// Set of habit ids with an outstanding completion toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSet {
    ids: HashSet<HabitId>,
}

impl PendingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a habit as pending. Returns `false` if it already was.
    pub fn mark(&mut self, id: &HabitId) -> bool {
        self.ids.insert(id.clone())
    }

    /// Clear the pending flag. Returns `true` if it was set.
    pub fn clear(&mut self, id: &HabitId) -> bool {
        self.ids.remove(id)
    }

    /// Membership test.
    pub fn is_pending(&self, id: &HabitId) -> bool {
        self.ids.contains(id)
    }

    /// Drop every pending flag.
    pub fn clear_all(&mut self) {
        self.ids.clear();
    }

    /// Number of pending habits.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

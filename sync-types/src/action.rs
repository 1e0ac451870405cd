//! Replayable mutation intents.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Habit, HabitId, Seq};

/// A durable intent to apply one mutation on the remote habit service.
///
/// Internally tagged on the wire: `{"type":"complete","id":"h1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncAction {
    /// Count one completion for today.
    Complete {
        /// Target habit
        id: HabitId,
    },
    /// Take back one of today's completions.
    Uncomplete {
        /// Target habit
        id: HabitId,
    },
    /// Replace the habit with this snapshot.
    Update {
        /// Full habit snapshot
        habit: Habit,
    },
    /// Create the habit with its client-assigned id.
    Create {
        /// Full habit snapshot
        habit: Habit,
    },
    /// Delete the habit.
    Delete {
        /// Target habit
        id: HabitId,
    },
}

/// Discriminant of a [`SyncAction`], for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// See [`SyncAction::Complete`]
    Complete,
    /// See [`SyncAction::Uncomplete`]
    Uncomplete,
    /// See [`SyncAction::Update`]
    Update,
    /// See [`SyncAction::Create`]
    Create,
    /// See [`SyncAction::Delete`]
    Delete,
}

impl ActionKind {
    /// Lowercase name, same as the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Complete => "complete",
            ActionKind::Uncomplete => "uncomplete",
            ActionKind::Update => "update",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl SyncAction {
    /// The habit this action targets.
    pub fn habit_id(&self) -> &HabitId {
        match self {
            SyncAction::Complete { id }
            | SyncAction::Uncomplete { id }
            | SyncAction::Delete { id } => id,
            SyncAction::Update { habit } | SyncAction::Create { habit } => &habit.id,
        }
    }

    /// Get the action kind.
    pub fn kind(&self) -> ActionKind {
        match self {
            SyncAction::Complete { .. } => ActionKind::Complete,
            SyncAction::Uncomplete { .. } => ActionKind::Uncomplete,
            SyncAction::Update { .. } => ActionKind::Update,
            SyncAction::Create { .. } => ActionKind::Create,
            SyncAction::Delete { .. } => ActionKind::Delete,
        }
    }

    /// The habit id when this action is a completion toggle.
    pub fn completion_target(&self) -> Option<&HabitId> {
        match self {
            SyncAction::Complete { id } | SyncAction::Uncomplete { id } => Some(id),
            _ => None,
        }
    }
}

/// An action together with the sequence number it was enqueued under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Position in the queue's lifetime ordering
    pub seq: Seq,
    /// The queued intent
    pub action: SyncAction,
}

impl QueuedAction {
    /// Pair an action with its sequence number.
    pub fn new(seq: Seq, action: SyncAction) -> Self {
        Self { seq, action }
    }
}

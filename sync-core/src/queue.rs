//! Sequenced action queue for habit-sync.
//!
//! This module provides the write-ahead log of not-yet-confirmed mutations:
//! - FIFO ordering for replay
//! - A sequence number per entry, so removal after a successful replay
//!   targets exactly the replayed entry even when identical actions are
//!   queued back to back
//! - A JSON blob codec for persisting the whole queue under one key
//!
//! The queue is passive. Draining it is the reconciliation engine's job.

use std::collections::VecDeque;

use habit_sync_types::{QueuedAction, Seq, SyncAction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for queue persistence.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The persisted blob could not be encoded.
    #[error("failed to encode queue: {0}")]
    Encode(#[source] serde_json::Error),

    /// The persisted blob could not be decoded.
    #[error("failed to decode queue: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Ordered log of queued actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionQueue {
    /// Sequence number the next enqueued action receives.
    next_seq: Seq,
    /// Actions waiting to be replayed, oldest first.
    entries: VecDeque<QueuedAction>,
}

/// On-disk form of the queue.
#[derive(Serialize, Deserialize)]
struct PersistedQueue {
    next_seq: Seq,
    actions: Vec<QueuedAction>,
}

/// Everything `decode` accepts.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredQueue {
    Sequenced(PersistedQueue),
    /// Bare array of actions, written before sequence numbers existed.
    Legacy(Vec<SyncAction>),
}

impl ActionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            next_seq: Seq::first(),
            entries: VecDeque::new(),
        }
    }

    /// Append an action and return the sequence number it was given.
    pub fn enqueue(&mut self, action: SyncAction) -> Seq {
        let seq = self.next_seq;
        self.next_seq = seq.next();
        self.entries.push_back(QueuedAction::new(seq, action));
        seq
    }

    /// Remove the entry with this sequence number.
    ///
    /// Returns the removed entry, or `None` if it was not queued.
    pub fn remove(&mut self, seq: Seq) -> Option<QueuedAction> {
        let idx = self.entries.iter().position(|e| e.seq == seq)?;
        self.entries.remove(idx)
    }

    /// Keep only the entries matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&QueuedAction) -> bool) {
        self.entries.retain(|e| keep(e));
    }

    /// Check whether an entry with this sequence number is queued.
    pub fn contains(&self, seq: Seq) -> bool {
        self.entries.iter().any(|e| e.seq == seq)
    }

    /// The oldest queued entry.
    pub fn front(&self) -> Option<&QueuedAction> {
        self.entries.front()
    }

    /// Copy of all entries in replay order.
    pub fn snapshot(&self) -> Vec<QueuedAction> {
        self.entries.iter().cloned().collect()
    }

    /// Iterate over entries in replay order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.entries.iter()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sequence number the next enqueue will hand out.
    pub fn next_seq(&self) -> Seq {
        self.next_seq
    }

    /// Drop all entries.
    ///
    /// The sequence counter keeps running so numbers are never reused.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialize the queue to its persisted JSON form.
    pub fn encode(&self) -> Result<String, QueueError> {
        let persisted = PersistedQueue {
            next_seq: self.next_seq,
            actions: self.snapshot(),
        };
        serde_json::to_string(&persisted).map_err(QueueError::Encode)
    }

    /// Rebuild a queue from its persisted JSON form.
    ///
    /// Also accepts a bare JSON array of actions; those get sequence
    /// numbers in array order.
    pub fn decode(raw: &str) -> Result<Self, QueueError> {
        let stored: StoredQueue = serde_json::from_str(raw).map_err(QueueError::Decode)?;
        Ok(match stored {
            StoredQueue::Sequenced(persisted) => {
                let entries: VecDeque<QueuedAction> = persisted.actions.into();
                // Never hand out a number that is already queued.
                let floor = entries
                    .iter()
                    .map(|e| e.seq.next())
                    .max()
                    .unwrap_or_else(Seq::first);
                Self {
                    next_seq: persisted.next_seq.max(floor),
                    entries,
                }
            }
            StoredQueue::Legacy(actions) => {
                let mut queue = Self::new();
                for action in actions {
                    queue.enqueue(action);
                }
                queue
            }
        })
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

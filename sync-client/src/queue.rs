//! Durable action queue.
//!
//! Wraps an [`ActionQueue`] persisted under [`QUEUE_KEY`]. Every operation
//! starts by re-reading the persisted blob, so the queue handed to the
//! drain loop is the stored one rather than a possibly stale in-memory copy.

use std::sync::Arc;

use habit_sync_core::ActionQueue;
use habit_sync_types::{QueuedAction, Seq, SyncAction};

use crate::kv::{KeyValueStore, QUEUE_KEY};

/// The write-ahead log of unconfirmed mutations.
#[derive(Debug)]
pub struct PersistentQueue<S> {
    store: Arc<S>,
    cached: ActionQueue,
    /// Last write failed; the cache is ahead of the store.
    dirty: bool,
}

impl<S: KeyValueStore> PersistentQueue<S> {
    /// Create a queue over `store`. Nothing is read until first use.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cached: ActionQueue::new(),
            dirty: false,
        }
    }

    /// Append an action and persist.
    ///
    /// Returns the updated queue so the caller can hand exactly this
    /// snapshot to the drain loop.
    pub fn enqueue(&mut self, action: SyncAction) -> Vec<QueuedAction> {
        self.refresh();
        let seq = self.cached.enqueue(action);
        tracing::debug!("Enqueued action seq={} (queue length {})", seq, self.cached.len());
        self.persist();
        self.cached.snapshot()
    }

    /// Remove the entry with this sequence number and persist.
    pub fn dequeue(&mut self, seq: Seq) -> bool {
        self.refresh();
        let removed = self.cached.remove(seq).is_some();
        if removed {
            tracing::debug!("Dequeued action seq={}", seq);
            self.persist();
        }
        removed
    }

    /// Current queue contents, oldest first.
    pub fn snapshot(&mut self) -> Vec<QueuedAction> {
        self.refresh();
        self.cached.snapshot()
    }

    /// Check whether an entry is still queued.
    pub fn contains(&mut self, seq: Seq) -> bool {
        self.refresh();
        self.cached.contains(seq)
    }

    /// Number of queued entries.
    pub fn len(&mut self) -> usize {
        self.refresh();
        self.cached.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and erase the persisted copy.
    pub fn clear(&mut self) {
        self.cached.clear();
        match self.store.remove(QUEUE_KEY) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                tracing::warn!("Failed to erase stored queue: {}", e);
                self.dirty = true;
            }
        }
    }

    /// Bring the cache in line with the store.
    fn refresh(&mut self) {
        if self.dirty {
            // Retry the failed write instead of reading older data back.
            self.persist();
            if self.dirty {
                return;
            }
        }

        match self.store.get_string(QUEUE_KEY) {
            Ok(Some(raw)) => match ActionQueue::decode(&raw) {
                Ok(queue) => self.cached = queue,
                Err(e) => {
                    tracing::warn!("Stored queue is corrupt, treating as empty: {}", e);
                    self.cached.clear();
                }
            },
            Ok(None) => self.cached.clear(),
            Err(e) => tracing::warn!("Failed to read stored queue, using cached copy: {}", e),
        }
    }

    fn persist(&mut self) {
        let result = self
            .cached
            .encode()
            .map_err(|e| e.to_string())
            .and_then(|encoded| {
                self.store
                    .set(QUEUE_KEY, &encoded)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => self.dirty = false,
            Err(e) => {
                tracing::warn!("Failed to persist queue: {}", e);
                self.dirty = true;
            }
        }
    }
}

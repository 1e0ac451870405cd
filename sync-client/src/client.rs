//! HabitSync - the main interface for habit-sync.
//!
//! This module provides [`HabitSync`], the handle applications use to read
//! and mutate habits while offline-tolerant sync happens underneath.
//!
//! # Architecture
//!
//! Every mutation is applied optimistically to the local [`HabitStore`],
//! appended to the durable [`PersistentQueue`], and, when online, replayed
//! against the remote service by a drain task spawned in the background
//! (see `engine`). Mutations return as soon as local state is updated;
//! [`HabitSync::settled`] waits for the drains they started.
//!
//! ```text
//! Application → HabitSync → HabitStore + PersistentQueue → KeyValueStore
//!                   ↓
//!              drain loop → RemoteHabits → Network
//!                   ↓
//!              sync-core (pure state machine)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use habit_sync_client::{ConnectivityMonitor, HabitSync, MemoryStore, MockRemote};
//! use habit_sync_core::SystemClock;
//!
//! let monitor = ConnectivityMonitor::new(true);
//! let sync = HabitSync::new(MockRemote::new(), MemoryStore::new(), Arc::new(SystemClock), monitor.subscribe());
//! sync.load();
//!
//! sync.create_habit(habit).await;
//! sync.complete_habit(&id).await;
//! sync.settled().await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use habit_sync_core::{Clock, DrainEvent, DrainState, DrainStep, PendingSet};
use habit_sync_types::{DayProgress, Habit, HabitId, QueuedAction, SyncAction};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::DrainReport;
use crate::habits::HabitStore;
use crate::kv::KeyValueStore;
use crate::queue::PersistentQueue;
use crate::remote::{CompletionDelta, RemoteHabits};

/// Handle to the habit collection and its sync engine.
///
/// Cheap to clone; clones share the same state. Construct one per process
/// at the composition root and pass clones to consumers.
pub struct HabitSync<R, S> {
    pub(crate) inner: Arc<Inner<R, S>>,
}

pub(crate) struct Inner<R, S> {
    pub(crate) remote: R,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) connectivity: watch::Receiver<bool>,
    pub(crate) local: Mutex<LocalState<S>>,
    /// Serializes drain passes and resets.
    pub(crate) drain_lock: tokio::sync::Mutex<()>,
    /// Drain tasks started by mutations.
    drains: Mutex<Vec<JoinHandle<DrainReport>>>,
}

pub(crate) struct LocalState<S> {
    pub(crate) habits: HabitStore<S>,
    pub(crate) queue: PersistentQueue<S>,
    pub(crate) pending: PendingSet,
    pub(crate) drain: DrainState,
    loaded: bool,
}

impl<S: KeyValueStore> LocalState<S> {
    /// Feed the drain state machine.
    pub(crate) fn drain_event(&mut self, event: DrainEvent) -> Vec<DrainStep> {
        let (next, steps) = std::mem::take(&mut self.drain).on_event(event);
        self.drain = next;
        steps
    }
}

impl<R, S> Clone for HabitSync<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S> HabitSync<R, S>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    /// Create a new handle.
    ///
    /// Nothing is read from `store` until [`HabitSync::load`] or the first
    /// operation that needs local state.
    pub fn new(
        remote: R,
        store: S,
        clock: Arc<dyn Clock>,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        let store = Arc::new(store);
        let local = LocalState {
            habits: HabitStore::new(Arc::clone(&store)),
            queue: PersistentQueue::new(store),
            pending: PendingSet::new(),
            drain: DrainState::new(),
            loaded: false,
        };
        Self {
            inner: Arc::new(Inner {
                remote,
                clock,
                connectivity,
                local: Mutex::new(local),
                drain_lock: tokio::sync::Mutex::new(()),
                drains: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Load the persisted habits and queue.
    ///
    /// Called implicitly by the first operation if the caller did not.
    pub fn load(&self) {
        let mut local = self.raw_local();
        if !local.loaded {
            Self::load_into(&mut local);
        }
    }

    fn load_into(local: &mut LocalState<S>) {
        local.habits.load();
        let queued = local.queue.len();
        local.loaded = true;
        tracing::info!(
            "Loaded {} habits, {} queued actions",
            local.habits.len(),
            queued
        );
    }

    fn raw_local(&self) -> MutexGuard<'_, LocalState<S>> {
        // Poisoning is ignored.
        self.inner
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock local state, loading it first if needed.
    pub(crate) fn local(&self) -> MutexGuard<'_, LocalState<S>> {
        let mut local = self.raw_local();
        if !local.loaded {
            Self::load_into(&mut local);
        }
        local
    }

    // ===========================================
    // Mutations
    // ===========================================
    //
    // Mutations update local state and return without waiting for the
    // network. When online they spawn a drain pass on the current Tokio
    // runtime.

    /// Count one completion for today.
    ///
    /// No-op for an unknown id. Marks the habit pending, bumps
    /// `completions_today` (capped at `completions_need`), queues a
    /// `complete` action and, if online, starts a drain.
    pub async fn complete_habit(&self, id: &HabitId) {
        self.toggle(id, CompletionDelta::Increment);
    }

    /// Take back one of today's completions.
    ///
    /// Symmetric to [`HabitSync::complete_habit`]; the counter floors at 0.
    pub async fn uncomplete_habit(&self, id: &HabitId) {
        self.toggle(id, CompletionDelta::Decrement);
    }

    fn toggle(&self, id: &HabitId, delta: CompletionDelta) {
        let queued = {
            let mut local = self.local();
            if !local.habits.contains(id) {
                tracing::debug!("Ignoring completion toggle for unknown habit {}", id);
                return;
            }

            local.pending.mark(id);
            let action = match delta {
                CompletionDelta::Increment => {
                    local.habits.mutate_local(id, Habit::record_completion);
                    SyncAction::Complete { id: id.clone() }
                }
                CompletionDelta::Decrement => {
                    local.habits.mutate_local(id, Habit::revert_completion);
                    SyncAction::Uncomplete { id: id.clone() }
                }
            };
            local.queue.enqueue(action)
        };

        self.trigger(queued);
    }

    /// Add a habit. The caller assigns its id.
    pub async fn create_habit(&self, habit: Habit) {
        let queued = {
            let mut local = self.local();
            tracing::debug!("Creating habit {}", habit.id);
            local.habits.insert(habit.clone());
            local.queue.enqueue(SyncAction::Create { habit })
        };

        self.trigger(queued);
    }

    /// Replace a habit with an edited copy. No-op for an unknown id.
    pub async fn update_habit(&self, habit: Habit) {
        let queued = {
            let mut local = self.local();
            if !local.habits.replace(habit.clone()) {
                tracing::debug!("Ignoring update for unknown habit {}", habit.id);
                return;
            }
            local.queue.enqueue(SyncAction::Update { habit })
        };

        self.trigger(queued);
    }

    /// Delete a habit. No-op for an unknown id.
    ///
    /// The habit leaves the local store immediately and is never brought
    /// back; the `delete` action goes through the same drain as every other
    /// action.
    pub async fn delete_habit(&self, id: &HabitId) {
        let queued = {
            let mut local = self.local();
            if local.habits.remove(id).is_none() {
                tracing::debug!("Ignoring delete for unknown habit {}", id);
                return;
            }
            local.pending.clear(id);
            local.queue.enqueue(SyncAction::Delete { id: id.clone() })
        };

        self.trigger(queued);
    }

    /// Wipe habits, queue and pending flags, including persisted copies.
    ///
    /// Waits for an in-flight drain pass to finish first. Used on logout.
    pub async fn reset_habits(&self) {
        let _drain = self.inner.drain_lock.lock().await;
        let mut local = self.local();

        local.habits.clear();
        local.queue.clear();
        local.pending.clear_all();
        local.drain_event(DrainEvent::Reset);
        tracing::info!("Local habit state reset");
    }

    fn trigger(&self, queued: Vec<QueuedAction>) {
        if !self.is_online() {
            tracing::debug!("Offline, {} actions wait in the queue", queued.len());
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No Tokio runtime, {} actions wait in the queue", queued.len());
            return;
        };

        let this = self.clone();
        let handle = runtime.spawn(async move { this.sync_with_server(Some(queued)).await });
        let mut drains = self.drains();
        drains.retain(|h| !h.is_finished());
        drains.push(handle);
    }

    fn drains(&self) -> MutexGuard<'_, Vec<JoinHandle<DrainReport>>> {
        self.inner
            .drains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until every drain started by a mutation has finished.
    ///
    /// Short-lived processes call this before exiting so queued actions are
    /// not abandoned mid-flight.
    pub async fn settled(&self) {
        loop {
            let handles = std::mem::take(&mut *self.drains());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!("Drain task failed: {}", e);
                }
            }
        }
    }

    // ===========================================
    // Reads
    // ===========================================

    /// Copy of the current habit list.
    pub fn habits(&self) -> Vec<Habit> {
        self.local().habits.snapshot()
    }

    /// Copy of one habit.
    pub fn habit(&self, id: &HabitId) -> Option<Habit> {
        self.local().habits.get(id).cloned()
    }

    /// Today's progress of a habit, per the injected clock.
    pub fn progress(&self, id: &HabitId) -> Option<DayProgress> {
        let today = self.inner.clock.today();
        self.local().habits.get(id).map(|h| h.progress_on(today, today))
    }

    /// Habits scheduled for today, per the injected clock.
    pub fn scheduled_today(&self) -> Vec<Habit> {
        let weekday = self.inner.clock.weekday();
        self.local()
            .habits
            .as_slice()
            .iter()
            .filter(|h| h.is_scheduled_on(weekday))
            .cloned()
            .collect()
    }

    /// True until the persisted state has been loaded.
    pub fn is_loading(&self) -> bool {
        !self.raw_local().loaded
    }

    /// Current reachability as reported by the connectivity monitor.
    pub fn is_online(&self) -> bool {
        *self.inner.connectivity.borrow()
    }

    /// Whether a completion toggle for this habit is awaiting confirmation.
    ///
    /// Consumers gate the complete/uncomplete affordance on this.
    pub fn is_pending(&self, id: &HabitId) -> bool {
        self.raw_local().pending.is_pending(id)
    }

    /// Actions still owed to the server, oldest first.
    pub fn queued_actions(&self) -> Vec<QueuedAction> {
        self.local().queue.snapshot()
    }

    /// State of the drain state machine.
    pub fn drain_state(&self) -> DrainState {
        self.raw_local().drain.clone()
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Borrow the remote service.
    pub fn remote(&self) -> &R {
        &self.inner.remote
    }
}

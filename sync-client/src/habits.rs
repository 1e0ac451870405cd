//! In-memory habit collection with write-through persistence.
//!
//! Every mutation rewrites the whole list under [`HABITS_KEY`]. A failed
//! write is logged and otherwise ignored: the in-memory copy stays
//! authoritative for the running process.

use std::sync::Arc;

use habit_sync_core::{merge_server_habits, overlay_queued};
use habit_sync_types::{Habit, HabitId, QueuedAction};

use crate::kv::{KeyValueStore, HABITS_KEY};

/// The canonical habit list.
#[derive(Debug)]
pub struct HabitStore<S> {
    store: Arc<S>,
    habits: Vec<Habit>,
}

impl<S: KeyValueStore> HabitStore<S> {
    /// Create an empty, unloaded store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            habits: Vec::new(),
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Absent, unreadable or corrupt data loads as an empty list.
    pub fn load(&mut self) {
        self.habits = match self.store.get_string(HABITS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(habits) => habits,
                Err(e) => {
                    tracing::warn!("Stored habit list is corrupt, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read stored habits: {}", e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} habits", self.habits.len());
    }

    /// Copy of the current list.
    pub fn snapshot(&self) -> Vec<Habit> {
        self.habits.clone()
    }

    /// Borrow the current list.
    pub fn as_slice(&self) -> &[Habit] {
        &self.habits
    }

    /// Look up a habit.
    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    /// Check whether a habit exists.
    pub fn contains(&self, id: &HabitId) -> bool {
        self.get(id).is_some()
    }

    /// Number of habits.
    pub fn len(&self) -> usize {
        self.habits.len()
    }

    /// Check if there are no habits.
    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Overwrite the entry with the same id.
    ///
    /// Returns `false` and changes nothing if no such entry exists, so a
    /// late server answer never resurrects a locally deleted habit.
    pub fn replace(&mut self, habit: Habit) -> bool {
        match self.habits.iter_mut().find(|h| h.id == habit.id) {
            Some(slot) => {
                *slot = habit;
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Apply `f` to the habit with this id. No-op if absent.
    pub fn mutate_local(&mut self, id: &HabitId, f: impl FnOnce(&mut Habit)) -> bool {
        match self.habits.iter_mut().find(|h| &h.id == id) {
            Some(habit) => {
                f(habit);
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Append a habit, or overwrite the entry with the same id.
    pub fn insert(&mut self, habit: Habit) {
        match self.habits.iter_mut().find(|h| h.id == habit.id) {
            Some(slot) => *slot = habit,
            None => self.habits.push(habit),
        }
        self.persist();
    }

    /// Remove a habit, returning it.
    pub fn remove(&mut self, id: &HabitId) -> Option<Habit> {
        let idx = self.habits.iter().position(|h| &h.id == id)?;
        let removed = self.habits.remove(idx);
        self.persist();
        Some(removed)
    }

    /// Replace the list with an authoritative server list.
    ///
    /// `queued` holds the actions the server has not seen yet; their intent
    /// is kept on top of the server's view. See [`merge_server_habits`] and
    /// [`overlay_queued`] for the precedence rules.
    pub fn merge_from_server(&mut self, server: Vec<Habit>, queued: &[QueuedAction]) {
        let merged = merge_server_habits(&self.habits, server);
        self.habits = overlay_queued(merged, &self.habits, queued);
        self.persist();
    }

    /// Drop every habit and erase the persisted copy.
    pub fn clear(&mut self) {
        self.habits.clear();
        if let Err(e) = self.store.remove(HABITS_KEY) {
            tracing::warn!("Failed to erase stored habits: {}", e);
        }
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string(&self.habits) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Failed to encode habits: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(HABITS_KEY, &encoded) {
            tracing::warn!("Failed to persist habits: {}", e);
        }
    }
}

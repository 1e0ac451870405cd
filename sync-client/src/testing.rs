//! Shared test fixtures.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use habit_sync_core::FixedClock;
use habit_sync_types::{Habit, HabitId};

use crate::client::HabitSync;
use crate::connectivity::ConnectivityMonitor;
use crate::kv::MemoryStore;
use crate::remote::MockRemote;

/// A habit created on 2025-12-01, scheduled every day.
pub fn habit(id: &str, need: u32) -> Habit {
    Habit::new(
        HabitId::new(id),
        format!("Habit {}", id),
        Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap(),
    )
    .with_completions_need(need)
}

/// A `HabitSync` wired to in-memory collaborators.
pub struct Fixture {
    pub sync: HabitSync<MockRemote, MemoryStore>,
    pub remote: MockRemote,
    pub store: MemoryStore,
    pub monitor: ConnectivityMonitor,
}

impl Fixture {
    pub fn with_store(store: MemoryStore, online: bool) -> Self {
        Self::build(MockRemote::new(), store, online)
    }

    fn build(remote: MockRemote, store: MemoryStore, online: bool) -> Self {
        let monitor = ConnectivityMonitor::new(online);
        // Wednesday
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2025, 12, 3).unwrap());
        let sync = HabitSync::new(
            remote.clone(),
            store.clone(),
            Arc::new(clock),
            monitor.subscribe(),
        );
        Self {
            sync,
            remote,
            store,
            monitor,
        }
    }

    /// A fresh process over the same device storage and server.
    pub fn restart(&self, online: bool) -> Self {
        Self::build(self.remote.clone(), self.store.clone(), online)
    }
}

pub fn offline() -> Fixture {
    Fixture::with_store(MemoryStore::new(), false)
}

pub fn online() -> Fixture {
    Fixture::with_store(MemoryStore::new(), true)
}

//! # habit-sync-client
//!
//! Offline-tolerant habit storage and sync for habit-sync.
//!
//! This is the library applications use to read and mutate habits. Every
//! mutation lands locally first and is replayed against the remote service
//! once it is reachable.
//!
//! ## Features
//!
//! - **Optimistic Local State**: Mutations apply instantly and persist to a key-value store
//! - **Durable Action Queue**: Unconfirmed mutations survive restarts
//! - **Ordered Replay**: Strict enqueue order, stop on first failure, resume later
//! - **Reconnect Trigger**: The queue drains on every offline→online edge
//! - **Pure State Machine**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use habit_sync_client::{ConnectivityMonitor, FileStore, HabitSync, HttpRemote, SyncConfig};
//! use habit_sync_core::SystemClock;
//!
//! let monitor = ConnectivityMonitor::new(true);
//! let remote = HttpRemote::new(&SyncConfig::default())?;
//! let sync = HabitSync::new(remote, FileStore::open(dir)?, Arc::new(SystemClock), monitor.subscribe());
//! sync.load();
//! let _watch = sync.watch_connectivity();
//!
//! sync.complete_habit(&id).await;
//! sync.settled().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod habits;
pub mod kv;
pub mod queue;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use client::HabitSync;
pub use config::SyncConfig;
pub use connectivity::ConnectivityMonitor;
pub use engine::DrainReport;
pub use habits::HabitStore;
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError, HABITS_KEY, QUEUE_KEY};
pub use queue::PersistentQueue;
pub use remote::{CompletionDelta, HttpRemote, MockRemote, RemoteCall, RemoteError, RemoteHabits};

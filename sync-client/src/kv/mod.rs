//! Persistent key-value storage.
//!
//! The engine keeps exactly two blobs in the store, each rewritten in full
//! on every change:
//! - [`HABITS_KEY`] - the habit list
//! - [`QUEUE_KEY`] - the action queue
//!
//! Access is synchronous; implementations serialize their own writes.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Key under which the habit list is stored.
pub const HABITS_KEY: &str = "habits";

/// Key under which the action queue is stored.
pub const QUEUE_KEY: &str = "sync_queue";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is not usable as a storage name.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Write rejected by the store.
    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Synchronous string storage that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if absent.
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

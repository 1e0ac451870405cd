//! In-memory key-value store for testing.

use super::{KeyValueStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory store.
///
/// Clones share the same map, so a clone handed to a second `HabitSync`
/// simulates a process restart over the same device storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    values: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail until turned off again.
    pub fn fail_writes(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_writes = fail;
    }

    /// Write a raw value, bypassing failure injection.
    pub fn put_raw(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.values.insert(key.to_string(), value.to_string());
    }

    /// Read a raw value.
    pub fn raw(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.values.get(key).cloned()
    }

    /// Number of successful writes and removals.
    pub fn write_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.writes
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if inner.fail_writes {
            return Err(StoreError::WriteRejected(format!("set {}", key)));
        }

        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_writes {
            return Err(StoreError::WriteRejected(format!("remove {}", key)));
        }

        inner.values.remove(key);
        inner.writes += 1;
        Ok(())
    }
}

//! # In-Memory String Store
//!
//! Thread-safe in-memory store using `RwLock<HashMap<String, String>>`:
//! - **Multiple concurrent readers**: `get` takes a shared read lock
//! - **Single writer**: `set` and `remove` take an exclusive write lock
//!
//! Clones share the same map, so a `MemoryStore` handed to a slot can still be
//! inspected by the code that created it.
//!
//! **Note**: This store is not persistent! All data is lost when the process
//! terminates. Use `SledStore` when state must survive a restart.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::kv_trait::KVStoreTrait;

/// Thread-safe in-memory string store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        // A poisoned map is still whole; report what it holds.
        self.data.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KVStoreTrait for MemoryStore {
    /// Retrieve a value by its key.
    ///
    /// Acquires a **shared read lock**; concurrent readers do not block each other.
    fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(data.get(key).cloned())
    }

    /// Store a key-value pair under an **exclusive write lock**.
    fn set(&self, key: String, value: String) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        data.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(data.remove(key).is_some())
    }
}

//! # String Store Trait
//!
//! This module defines the synchronous key/value string store the state engine
//! persists into. It is the only capability the engine needs from its
//! environment: read a string under a key, write a string under a key, and
//! drop a key.
//!
//! ## Implementations
//!
//! - `MemoryStore`: Thread-safe in-memory storage using RwLock<HashMap>
//! - `SledStore`: Persistent storage on a sled tree

use anyhow::Result;

/// Common interface for all string stores.
///
/// All stores must be safe to share across threads (Send + Sync) because the
/// same store is usually reachable from several engines through a slot.
#[cfg_attr(test, mockall::automock)]
pub trait KVStoreTrait: Send + Sync {
    /// Retrieve the string stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - A value was stored
    /// * `Ok(None)` - Nothing has ever been stored under `key` (or it was removed)
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set(&self, key: String, value: String) -> Result<()>;

    /// Remove the value under `key`.
    ///
    /// # Returns
    /// * `bool` - True if a value existed and was removed, false otherwise
    fn remove(&self, key: &str) -> Result<bool>;
}

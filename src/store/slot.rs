//! # Storage Slot
//!
//! A slot is where an engine looks for its store at call time. It either holds
//! a store or it is empty, which is how a host environment without storage
//! looks to the engine. Clones of a slot share the same contents, so a store
//! installed through one handle is seen by every engine bound to the slot.
//!
//! `local_storage()` is the process-wide slot used by `create_engine`. It
//! starts out empty; the host installs a store into it once one exists.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::kv_trait::KVStoreTrait;

static LOCAL_STORAGE: Lazy<StorageSlot> = Lazy::new(StorageSlot::empty);

/// The process-wide storage slot.
pub fn local_storage() -> &'static StorageSlot {
    &LOCAL_STORAGE
}

#[derive(Clone, Default)]
pub struct StorageSlot {
    inner: Arc<RwLock<Option<Arc<dyn KVStoreTrait>>>>,
}

impl StorageSlot {
    /// A slot with no store in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn KVStoreTrait>) -> Self {
        let slot = Self::empty();
        slot.install(store);
        slot
    }

    /// Put `store` in the slot, replacing whatever was there.
    pub fn install(&self, store: Arc<dyn KVStoreTrait>) {
        // A poisoned slot only means a writer panicked mid-swap; the Option is still whole.
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(store);
    }

    /// Take the store out of the slot, leaving it empty.
    pub fn uninstall(&self) -> Option<Arc<dyn KVStoreTrait>> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.take()
    }

    /// The store currently in the slot, if any.
    pub fn current(&self) -> Option<Arc<dyn KVStoreTrait>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }
}

impl fmt::Debug for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSlot")
            .field("available", &self.is_available())
            .finish()
    }
}

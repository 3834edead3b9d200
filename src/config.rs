//! # Configuration Management
//!
//! Engine settings loaded from a TOML file: which key to persist under and
//! which store backs it. Every field has a default, so a file only needs the
//! settings it changes.
//!
//! ## Example Configuration File (config.toml)
//! ```toml
//! key = "app_state"
//! backend = "sled"
//! storage_path = "data"
//! tree = "state_engine"
//! ```

use config::{Config as ConfigLib, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::engine::StorageEngine;
use crate::error::{Error, Result};
use crate::store::{KVStoreTrait, MemoryStore, SledStore, StorageSlot};

/// Which string store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process map; nothing survives a restart
    Memory,
    /// Embedded sled database under `storage_path`
    Sled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key the state is stored under
    pub key: String,

    /// Store implementation ("memory" or "sled")
    pub backend: BackendKind,

    /// Directory of the sled database (ignored by the memory backend)
    pub storage_path: String,

    /// Sled tree holding the engine's keys
    pub tree: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key: "state".to_string(),
            backend: BackendKind::Sled,
            storage_path: "data".to_string(),
            tree: "state_engine".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file. The format follows the file extension.
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::path::Path;
    /// use state_engine::EngineConfig;
    /// let config = EngineConfig::load(Path::new("config.toml"))?;
    /// # Ok::<(), state_engine::Error>(())
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(File::from(path))
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Open the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn KVStoreTrait>> {
        let store: Arc<dyn KVStoreTrait> = match self.backend {
            BackendKind::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
            BackendKind::Sled => Arc::new(
                SledStore::open(&self.storage_path, &self.tree).map_err(Error::backend)?,
            ),
        };
        Ok(store)
    }

    /// Open the configured store and bind a new engine to it.
    ///
    /// The engine gets its own slot, separate from `local_storage()`.
    pub fn build_engine(&self) -> Result<StorageEngine> {
        let slot = StorageSlot::with_store(self.open_store()?);
        Ok(StorageEngine::new(slot, self.key.clone()))
    }
}

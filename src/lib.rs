//! # state_engine
//!
//! Persists a JSON state value under one key of a string key/value store and
//! reads it back, behind an `async` interface.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use state_engine::{create_engine, local_storage, MemoryStore};
//!
//! # async fn run() -> state_engine::Result<()> {
//! local_storage().install(Arc::new(MemoryStore::new()));
//!
//! let engine = create_engine("app_state", None, None);
//! engine.save(&json!({"theme": "dark"})).await?;
//! assert_eq!(engine.load().await?, json!({"theme": "dark"}));
//! # Ok(())
//! # }
//! ```
//!
//! - **`engine`**: `StorageEngine` and the `PersistenceEngine` trait
//! - **`hooks`**: replacer / reviver transforms
//! - **`store`**: the string stores and the slot engines find them in
//! - **`config`**: file-based engine setup
//! - **`error`**: error taxonomy

pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod store;

pub use config::{BackendKind, EngineConfig};
pub use engine::{PersistenceEngine, StorageEngine};
pub use error::{Error, Result};
pub use hooks::{Replacer, Reviver};
pub use store::{local_storage, KVStoreTrait, MemoryStore, SledStore, StorageSlot};

/// Create an engine bound to the process-wide `local_storage()` slot.
///
/// No I/O happens here; the slot is checked on every `load` and `save`.
pub fn create_engine(
    key: impl Into<String>,
    replacer: Option<Replacer>,
    reviver: Option<Reviver>,
) -> StorageEngine {
    let mut engine = StorageEngine::new(local_storage().clone(), key);
    if let Some(replacer) = replacer {
        engine = engine.with_replacer(replacer);
    }
    if let Some(reviver) = reviver {
        engine = engine.with_reviver(reviver);
    }
    engine
}

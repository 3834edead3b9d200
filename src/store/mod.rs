//! # Store Module
//!
//! The synchronous string store that state is persisted into:
//!
//! - **`kv_trait`**: Common interface for all stores
//! - **`memory_engine`**: Thread-safe in-memory store using RwLock<HashMap>
//! - **`sled_engine`**: Persistent store on an embedded sled database
//! - **`slot`**: Where an engine finds its store at call time
//!
//! Any type implementing `KVStoreTrait` can be installed in a slot, so backends
//! can be swapped without touching the engine.

pub mod kv_trait;
pub mod memory_engine;
pub mod sled_engine;
pub mod slot;

pub use kv_trait::KVStoreTrait;
pub use memory_engine::MemoryStore;
pub use sled_engine::SledStore;
pub use slot::{local_storage, StorageSlot};

// src/store/sled_engine.rs
use anyhow::{Context, Result};
use log::info;
use sled::{Db, IVec, Tree};
use std::path::Path;

use super::kv_trait::KVStoreTrait;

/// Persistent string store on a named sled tree.
pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(storage_path: P, tree: &str) -> Result<Self> {
        let path = storage_path.as_ref();
        let db = sled::open(path)
            .with_context(|| format!("opening sled database at {}", path.display()))?;
        let tree = db
            .open_tree(tree.as_bytes())
            .with_context(|| format!("opening sled tree '{}'", tree))?;
        info!("Opened sled store at {}", path.display());
        Ok(Self { db, tree })
    }

    /// Flush dirty pages to disk. Returns once the data is durable.
    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("flushing sled database")?;
        Ok(())
    }

    fn decode(key: &str, raw: IVec) -> Result<String> {
        String::from_utf8(raw.to_vec())
            .with_context(|| format!("value under key '{}' is not valid UTF-8", key))
    }
}

impl KVStoreTrait for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let raw = self
            .tree
            .get(key)
            .with_context(|| format!("reading key '{}'", key))?;
        raw.map(|ivec| Self::decode(key, ivec)).transpose()
    }

    fn set(&self, key: String, value: String) -> Result<()> {
        self.tree
            .insert(key.as_bytes(), value.as_bytes())
            .with_context(|| format!("writing key '{}'", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let old = self
            .tree
            .remove(key)
            .with_context(|| format!("removing key '{}'", key))?;
        Ok(old.is_some())
    }
}

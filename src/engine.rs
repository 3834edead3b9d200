//! # Storage Engine
//!
//! `StorageEngine` turns a state value into JSON text and keeps it under one
//! key of a string store, and reads it back again.
//!
//! The store underneath is synchronous, but `load`, `save` and `clear` are
//! `async` so that call sites do not change when a truly asynchronous backend
//! is swapped in through `PersistenceEngine`. Every future here completes on
//! its first poll.
//!
//! The engine holds no state besides its configuration. It looks up its store
//! in a `StorageSlot` on every call; an empty slot fails the call with
//! `Error::StoreUnavailable` before anything else happens.

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hooks::{Replacer, Reviver};
use crate::store::{KVStoreTrait, StorageSlot};

/// Loads and saves one state value under a fixed key.
#[derive(Clone, Debug)]
pub struct StorageEngine {
    key: String,
    replacer: Option<Replacer>,
    reviver: Option<Reviver>,
    slot: StorageSlot,
}

impl StorageEngine {
    /// Create an engine that persists under `key` into whatever store `slot`
    /// holds at call time. Performs no I/O.
    pub fn new(slot: StorageSlot, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            replacer: None,
            reviver: None,
            slot,
        }
    }

    pub fn with_replacer(mut self, replacer: Replacer) -> Self {
        self.replacer = Some(replacer);
        self
    }

    pub fn with_reviver(mut self, reviver: Reviver) -> Self {
        self.reviver = Some(reviver);
        self
    }

    /// The key this engine reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn store(&self) -> Result<Arc<dyn KVStoreTrait>> {
        self.slot.current().ok_or(Error::StoreUnavailable)
    }

    /// Read the stored state.
    ///
    /// Resolves to an empty object when nothing was ever stored under the key;
    /// the reviver still sees that object. A stored `null` is returned as
    /// `Value::Null`.
    pub async fn load(&self) -> Result<Value> {
        let store = self.store()?;
        let raw = store.get(&self.key).map_err(|e| {
            warn!("Failed to read key '{}': {:#}", self.key, e);
            Error::backend(e)
        })?;

        let value = match raw {
            Some(text) => {
                debug!("Loaded {} bytes from key '{}'", text.len(), self.key);
                serde_json::from_str(&text).map_err(|e| Error::parse(e.to_string()))?
            }
            None => {
                debug!("No state under key '{}', using empty object", self.key);
                Value::Object(Map::new())
            }
        };
        Ok(match &self.reviver {
            Some(reviver) => reviver.apply(value),
            None => value,
        })
    }

    /// `load`, then convert the result into `T`.
    ///
    /// A missing key is converted from an empty object, so `T` must accept `{}`
    /// (e.g. a map, or a struct whose fields all have defaults).
    pub async fn load_into<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.load().await?;
        serde_json::from_value(value).map_err(|e| Error::parse(e.to_string()))
    }

    /// Serialize `state` and write it under the key with a single `set`.
    pub async fn save<T: Serialize + ?Sized>(&self, state: &T) -> Result<()> {
        let store = self.store()?;
        let text = self.encode(state)?;
        debug!("Saving {} bytes under key '{}'", text.len(), self.key);

        store.set(self.key.clone(), text).map_err(|e| {
            warn!("Failed to write key '{}': {:#}", self.key, e);
            Error::backend(e)
        })
    }

    /// Remove the stored state. Returns whether anything was stored.
    pub async fn clear(&self) -> Result<bool> {
        let store = self.store()?;
        let existed = store.remove(&self.key).map_err(|e| {
            warn!("Failed to remove key '{}': {:#}", self.key, e);
            Error::backend(e)
        })?;
        debug!("Cleared key '{}' (existed: {})", self.key, existed);
        Ok(existed)
    }

    fn encode<T: Serialize + ?Sized>(&self, state: &T) -> Result<String> {
        let to_err = |e: serde_json::Error| Error::serialization(e.to_string());
        match &self.replacer {
            None => serde_json::to_string(state).map_err(to_err),
            Some(replacer) => {
                let value = serde_json::to_value(state).map_err(to_err)?;
                serde_json::to_string(&replacer.apply(value)).map_err(to_err)
            }
        }
    }
}

/// Object-safe persistence interface.
///
/// Callers that hold a `Box<dyn PersistenceEngine>` keep working when the
/// local engine is replaced with one backed by a remote or async store.
#[async_trait]
pub trait PersistenceEngine: Send + Sync {
    async fn load(&self) -> Result<Value>;

    async fn save(&self, state: &Value) -> Result<()>;

    async fn clear(&self) -> Result<bool>;
}

#[async_trait]
impl PersistenceEngine for StorageEngine {
    async fn load(&self) -> Result<Value> {
        StorageEngine::load(self).await
    }

    async fn save(&self, state: &Value) -> Result<()> {
        StorageEngine::save(self, state).await
    }

    async fn clear(&self) -> Result<bool> {
        StorageEngine::clear(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv_trait::MockKVStoreTrait;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine_over(mock: MockKVStoreTrait) -> StorageEngine {
        StorageEngine::new(StorageSlot::with_store(Arc::new(mock)), "key")
    }

    fn returning_on_get(stored: Option<&'static str>) -> MockKVStoreTrait {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_get()
            .returning(move |_| Ok(stored.map(str::to_string)));
        mock
    }

    #[tokio::test]
    async fn test_load_reads_via_get() {
        let engine = engine_over(returning_on_get(Some(r#"{"a":1}"#)));
        let result = engine.load().await.unwrap();
        assert_eq!(result, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_load_uses_the_given_key() {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_get()
            .withf(|key: &str| key == "key")
            .times(1)
            .returning(|_| Ok(None));

        engine_over(mock).load().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_falls_back_to_empty_object() {
        let engine = engine_over(returning_on_get(None));
        let result = engine.load().await.unwrap();
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn test_load_keeps_stored_null() {
        let engine = engine_over(returning_on_get(Some("null")));
        assert_eq!(engine.load().await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_load_rejects_without_store() {
        let engine = StorageEngine::new(StorageSlot::empty(), "key");
        let err = engine.load().await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(err.to_string().contains("localStorage is not defined"));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_json() {
        let engine = engine_over(returning_on_get(Some(r#"{"a"#)));
        let err = engine.load().await.unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("EOF while parsing"), "{}", err);
    }

    #[tokio::test]
    async fn test_load_surfaces_backend_failure() {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_get()
            .returning(|_| Err(anyhow::anyhow!("disk unplugged")));

        let err = engine_over(mock).load().await.unwrap_err();
        assert_eq!(err, Error::backend(anyhow::anyhow!("disk unplugged")));
    }

    #[tokio::test]
    async fn test_load_uses_reviver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let reviver = Reviver::new(move |_, value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(value)
        });

        let engine = engine_over(returning_on_get(Some(r#"{"a":[1,2]}"#))).with_reviver(reviver);
        assert_eq!(engine.load().await.unwrap(), json!({"a": [1, 2]}));
        // two elements, the array, the root
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_load_runs_reviver_over_empty_fallback() {
        let keys = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = keys.clone();
        let reviver = Reviver::new(move |key, value| {
            seen.lock().unwrap().push(key.to_string());
            Some(value)
        });

        let engine = engine_over(returning_on_get(None)).with_reviver(reviver);
        assert_eq!(engine.load().await.unwrap(), json!({}));
        assert_eq!(*keys.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_load_into_typed_state() {
        let engine = engine_over(returning_on_get(Some(r#"{"a":1,"b":2}"#)));
        let state: HashMap<String, i64> = engine.load_into().await.unwrap();
        assert_eq!(state.get("b"), Some(&2));

        let engine = engine_over(returning_on_get(None));
        let state: HashMap<String, i64> = engine.load_into().await.unwrap();
        assert!(state.is_empty());

        let engine = engine_over(returning_on_get(Some(r#"{"a":"text"}"#)));
        let err = engine.load_into::<HashMap<String, i64>>().await.unwrap_err();
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn test_save_writes_via_set() {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_set().times(1).returning(|_, _| Ok(()));

        engine_over(mock).save(&json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_writes_json_under_the_given_key() {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_set()
            .withf(|key: &String, value: &String| key == "key" && value == r#"{"a":1}"#)
            .times(1)
            .returning(|_, _| Ok(()));

        engine_over(mock).save(&json!({"a": 1})).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_without_store() {
        let engine = StorageEngine::new(StorageSlot::empty(), "key");
        let err = engine.save(&json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "localStorage is not defined");
    }

    #[tokio::test]
    async fn test_save_rejects_unserializable_state() {
        let mut mock = MockKVStoreTrait::new();
        mock.expect_set().never();

        let mut state = HashMap::new();
        state.insert((1, 2), "tuple keys have no JSON form");

        let err = engine_over(mock).save(&state).await.unwrap_err();
        assert!(err.is_serialization());
        assert!(err.to_string().contains("key must be a string"), "{}", err);
    }

    #[tokio::test]
    async fn test_save_uses_replacer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let replacer = Replacer::function(move |_, value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(value)
        });

        let mut mock = MockKVStoreTrait::new();
        mock.expect_set()
            .withf(|_: &String, value: &String| value == "{}")
            .returning(|_, _| Ok(()));

        engine_over(mock)
            .with_replacer(replacer)
            .save(&json!({}))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Serialize)]
    struct Unsorted {
        z: u32,
        a: u32,
    }

    #[tokio::test]
    async fn test_identity_replacer_keeps_field_order() {
        let state = Unsorted { z: 1, a: 2 };

        let (plain_store, with_replacer_store) = (MemoryStore::new(), MemoryStore::new());
        StorageEngine::new(StorageSlot::with_store(Arc::new(plain_store.clone())), "key")
            .save(&state)
            .await
            .unwrap();
        StorageEngine::new(StorageSlot::with_store(Arc::new(with_replacer_store.clone())), "key")
            .with_replacer(Replacer::function(|_, v| Some(v)))
            .save(&state)
            .await
            .unwrap();

        let plain = plain_store.get("key").unwrap();
        assert_eq!(plain, Some(r#"{"z":1,"a":2}"#.to_string()));
        assert_eq!(with_replacer_store.get("key").unwrap(), plain);
    }

    #[tokio::test]
    async fn test_load_keeps_stored_member_order() {
        let store = MemoryStore::new();
        store.set("key".to_string(), r#"{"z":1,"a":2}"#.to_string()).unwrap();
        let engine = StorageEngine::new(StorageSlot::with_store(Arc::new(store)), "key")
            .with_reviver(Reviver::new(|_, v| Some(v)));

        let loaded = engine.load().await.unwrap();
        let keys: Vec<&String> = loaded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let store = MemoryStore::new();
        let engine = StorageEngine::new(StorageSlot::with_store(Arc::new(store.clone())), "key");

        engine.save(&json!({"a": 1})).await.unwrap();
        assert!(engine.clear().await.unwrap());
        assert!(!engine.clear().await.unwrap());
        assert!(store.is_empty());
        assert_eq!(engine.load().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_store_is_looked_up_per_call() {
        let slot = StorageSlot::empty();
        let engine = StorageEngine::new(slot.clone(), "key");
        assert!(engine.load().await.unwrap_err().is_store_unavailable());

        slot.install(Arc::new(MemoryStore::new()));
        engine.save(&json!({"late": true})).await.unwrap();
        assert_eq!(engine.load().await.unwrap(), json!({"late": true}));

        slot.uninstall();
        assert!(engine.save(&json!({})).await.unwrap_err().is_store_unavailable());
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let engine: Box<dyn PersistenceEngine> = Box::new(StorageEngine::new(
            StorageSlot::with_store(Arc::new(MemoryStore::new())),
            "key",
        ));

        engine.save(&json!({"n": [1, 2, 3]})).await.unwrap();
        assert_eq!(engine.load().await.unwrap(), json!({"n": [1, 2, 3]}));
        assert!(engine.clear().await.unwrap());
    }
}

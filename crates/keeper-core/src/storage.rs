//! Durable key-value storage for small UI preferences.
//!
//! Stores are string-keyed and string-valued, mirroring browser
//! `localStorage`. Reads never fail: absent or malformed values fall back
//! to the caller's default.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Serialize};

use crate::KeeperError;

/// Key of the inspector "open" flag.
pub const EDITOR_OPEN_KEY: &str = "rk:editor:open";
/// Key of the launcher position (JSON `{"x":..,"y":..}`).
pub const EDITOR_POS_KEY: &str = "rk:editor:pos";
/// Key of the testing-mode flag.
pub const TESTING_MODE_KEY: &str = "rk:testing:mode";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), KeeperError>;

    /// Delete a value.
    fn remove(&self, key: &str) -> Result<(), KeeperError>;
}

/// In-memory store, used for tests and server rendering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeeperError> {
        self.entries
            .write()
            .map_err(|e| KeeperError::Storage(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeeperError> {
        self.entries
            .write()
            .map_err(|e| KeeperError::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Store for environments without durable storage. Reads nothing, keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl KeyValueStore for NoopStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), KeeperError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), KeeperError> {
        Ok(())
    }
}

/// Read a boolean flag; only the string `"true"` is true.
pub fn read_flag(store: &dyn KeyValueStore, key: &str) -> bool {
    store.get(key).as_deref() == Some("true")
}

/// Write a boolean flag as `"true"`/`"false"`.
pub fn write_flag(store: &dyn KeyValueStore, key: &str, value: bool) -> Result<(), KeeperError> {
    store.set(key, if value { "true" } else { "false" })
}

/// Read a JSON value, or `None` when absent or malformed.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(key, error = %err, "ignoring malformed stored value");
            None
        }
    }
}

/// Write a value as JSON.
pub fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), KeeperError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

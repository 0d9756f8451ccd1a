//! Browser-backed durable storage.

use std::sync::Arc;

use keeper_core::{KeeperError, KeyValueStore, NoopStore};

/// `window.localStorage`.
///
/// The storage object is looked up on every call, so the store itself holds
/// no browser handle and can be shared across the reactive graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

impl BrowserStore {
    /// Whether `localStorage` can be reached right now.
    pub fn available() -> bool {
        local_storage().is_some()
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeeperError> {
        local_storage().ok_or_else(unavailable)?.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), KeeperError> {
        local_storage().ok_or_else(unavailable)?.remove(key)
    }
}

fn unavailable() -> KeeperError {
    KeeperError::Storage("localStorage is not available".to_string())
}

/// The store RouteKeeper uses by default: `localStorage` when running in a
/// browser, otherwise a store that keeps nothing.
pub fn browser_store() -> Arc<dyn KeyValueStore> {
    if BrowserStore::available() {
        Arc::new(BrowserStore)
    } else {
        tracing::debug!("localStorage unavailable, preferences will not persist");
        Arc::new(NoopStore)
    }
}

#[cfg(target_arch = "wasm32")]
struct LocalStorage(web_sys::Storage);

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<LocalStorage> {
    web_sys::window()?
        .local_storage()
        .ok()
        .flatten()
        .map(LocalStorage)
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeeperError> {
        self.0
            .set_item(key, value)
            .map_err(|e| KeeperError::Storage(format!("setItem({key}) failed: {e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), KeeperError> {
        self.0
            .remove_item(key)
            .map_err(|e| KeeperError::Storage(format!("removeItem({key}) failed: {e:?}")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
enum LocalStorage {}

#[cfg(not(target_arch = "wasm32"))]
fn local_storage() -> Option<LocalStorage> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorage {
    fn get(&self, _key: &str) -> Option<String> {
        match *self {}
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), KeeperError> {
        match *self {}
    }

    fn remove(&self, _key: &str) -> Result<(), KeeperError> {
        match *self {}
    }
}

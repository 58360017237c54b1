use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use super::store::KeyValueStore;

/// Key holding the last selected tab id.
pub const ACTIVE_TAB_KEY: &str = "activeTab";

/// Key holding the autosaved draft of a form.
pub fn draft_key(form_id: &str) -> String {
    format!("draft_{form_id}")
}

/// Key holding the last good API response for a cache key.
pub fn backup_key(cache_key: &str) -> String {
    format!("backup_{cache_key}")
}

/// Typed, failure-tolerant access to the local key-value store.
///
/// Local persistence is best-effort: read failures behave like a missing key
/// and write failures are logged and dropped, so a broken store only disables
/// drafts, tab memory and offline backups.
#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager").finish_non_exhaustive()
    }
}

impl StorageManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read and decode `key`, `None` when missing, unreadable or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.store.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read local storage");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed local storage entry");
                None
            }
        }
    }

    /// Like [`get`](Self::get) but falls back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Encode and write `value`. Returns `false` if the write was dropped.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "failed to encode local storage entry");
                return false;
            }
        };
        match self.store.set(key, encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to write local storage");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key, error = %e, "failed to remove local storage entry");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear local storage");
        }
    }

    /// Stored keys, empty if the store cannot be read.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list local storage keys");
            Vec::new()
        })
    }
}

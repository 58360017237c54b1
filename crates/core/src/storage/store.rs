use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::CoreError;

/// Persistent string-keyed JSON storage (the client's local storage).
///
/// Implementations must be usable from several tasks at once; values are
/// whole JSON documents and every write replaces the previous value.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, CoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;

    fn clear(&self) -> Result<(), CoreError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, CoreError>;
}

/// Volatile store, used in tests and when no data file is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.lock().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every operation re-reads the file, so separate processes sharing the file
/// see each other's writes; concurrent writers race and the last write wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, CoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::Storage(format!(
                    "Failed to parse data file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_vec_pretty(entries)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;

        // Write next to the target and rename so readers never see a torn file.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.update(|entries| entries.clear())
    }

    fn keys(&self) -> Result<Vec<String>, CoreError> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.into_keys().collect())
    }
}

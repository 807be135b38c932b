//! Key-value stores backing client-local state such as rate-limit records

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads and rewrites `key` as one step, with no other writer in
    /// between. Returning `None` from `apply` leaves the entry untouched.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<(), StoreError>;

    /// Drops every entry `keep` rejects and returns how many went.
    fn retain(&self, keep: &mut dyn FnMut(&str, &str) -> bool) -> Result<usize, StoreError>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        if let Some(next) = apply(entries.get(key).map(String::as_str)) {
            entries.insert(key.to_string(), next);
        }
        Ok(())
    }

    fn retain(&self, keep: &mut dyn FnMut(&str, &str) -> bool) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, value| keep(key, value));
        Ok(before - entries.len())
    }
}

/// Persists all entries as one JSON object on disk. A missing file reads as
/// an empty store.
///
/// Every call reads and rewrites the whole file with blocking I/O on the
/// caller's thread, serialized by an in-process lock. Meant for a single,
/// low-traffic instance; several processes sharing one file can still race.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;

        match apply(entries.get(key).map(String::as_str)) {
            Some(next) => {
                entries.insert(key.to_string(), next);
                self.write_entries(&entries)
            }
            None => Ok(()),
        }
    }

    fn retain(&self, keep: &mut dyn FnMut(&str, &str) -> bool) -> Result<usize, StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|key, value| keep(key, value));

        let removed = before - entries.len();
        if removed > 0 {
            self.write_entries(&entries)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("key", "value").unwrap();
        store.set("key", "updated").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("updated"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_skips_write_on_none() {
        let store = MemoryStore::new();
        store.update("count", &mut |current| {
            assert_eq!(current, None);
            Some("1".to_string())
        })
        .unwrap();
        store.update("count", &mut |_| None).unwrap();

        assert_eq!(store.get("count").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_retain_reports_removed() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store.set(key, key).unwrap();
        }

        let removed = store.retain(&mut |key, _| key == "b").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_update_and_retain() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("store.json"));

        store.update("kept", &mut |_| Some("yes".to_string())).unwrap();
        store.set("dropped", "no").unwrap();
        assert_eq!(store.retain(&mut |_, value| value == "yes").unwrap(), 1);

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.get("kept").unwrap().as_deref(), Some("yes"));
        assert_eq!(reopened.get("dropped").unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.set("shared", "yes").unwrap();
        assert_eq!(store.get("shared").unwrap().as_deref(), Some("yes"));
    }
}

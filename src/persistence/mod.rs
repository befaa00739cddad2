//! Key-value persistence
//!
//! One small seam over LocalStorage (wasm) with an in-memory stand-in for
//! native runs and tests. Values are JSON strings under namespaced keys.
//! Anything unreadable is treated as absent, never as a fatal error.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// String key-value store
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Volatile store; can be told to reject reads or writes
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a storage medium that can't be read
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Simulate a full or disabled storage medium
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Write a raw value, bypassing `fail_writes`
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError(format!("read of '{}' rejected", key)));
        }
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError(format!("write to '{}' rejected", key)));
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StorageError("LocalStorage unavailable".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError(format!("read '{}' failed: {:?}", key, e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError(format!("write '{}' failed: {:?}", key, e)))
    }
}

/// Read and decode `key`. Missing, unreadable, or corrupt data is `None`.
pub fn load_json<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Storage read failed: {}", e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt data under '{}': {}", key, e);
            None
        }
    }
}

/// Encode and write `value` under `key`
pub fn save_json<T: Serialize>(
    storage: &mut impl Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)
        .map_err(|e| StorageError(format!("encode '{}' failed: {}", key, e)))?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let mut storage = MemoryStorage::new();
        save_json(&mut storage, "k", &vec![1, 2, 3]).unwrap();
        assert_eq!(load_json::<Vec<i32>>(&storage, "k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_missing_and_corrupt_are_none() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_json::<Vec<i32>>(&storage, "k"), None);
        storage.insert_raw("k", "{not json");
        assert_eq!(load_json::<Vec<i32>>(&storage, "k"), None);
    }

    #[test]
    fn test_failed_write_keeps_old_value() {
        let mut storage = MemoryStorage::new();
        save_json(&mut storage, "k", &1).unwrap();
        storage.set_fail_writes(true);
        assert!(save_json(&mut storage, "k", &2).is_err());
        assert_eq!(load_json::<i32>(&storage, "k"), Some(1));
    }

    #[test]
    fn test_failed_read_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.insert_raw("k", "1");
        storage.set_fail_reads(true);
        assert!(storage.get("k").is_err());
        assert_eq!(load_json::<i32>(&storage, "k"), None);
    }
}

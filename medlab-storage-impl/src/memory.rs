use crate::storage_traits::{check_version, next_version, validate_key, LedgerStore, VersionedValue};
use medlab_core::error::StorageError;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory ledger store, used for tests and for embedding the ledger in a host
/// that persists state itself
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<HashMap<String, VersionedValue>>,
}

impl MemoryLedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, VersionedValue>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire lock: {}", e)))
    }

    /// Number of keys currently stored
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        validate_key(key)?;
        let mut entries = self.lock()?;
        let version = next_version(entries.get(key).map(|v| v.version));
        entries.insert(key.to_string(), VersionedValue::new(value.to_vec(), version));
        Ok(version)
    }

    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError> {
        validate_key(key)?;
        let mut entries = self.lock()?;
        let actual = entries.get(key).map(|v| v.version);
        check_version(key, expected, actual)?;

        let version = next_version(actual);
        entries.insert(key.to_string(), VersionedValue::new(value.to_vec(), version));
        Ok(version)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

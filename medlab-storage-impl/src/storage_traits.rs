use medlab_core::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Version assigned to a key by its first write
pub const INITIAL_VERSION: u64 = 1;

/// A stored value together with the number of times its key has been written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Opaque record bytes
    pub value: Vec<u8>,

    /// Per-key write counter, starting at [`INITIAL_VERSION`]
    pub version: u64,
}

impl VersionedValue {
    pub fn new(value: Vec<u8>, version: u64) -> Self {
        Self { value, version }
    }
}

/// Reject keys that cannot address a ledger record
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Version a write must produce given the version currently stored
pub fn next_version(current: Option<u64>) -> u64 {
    current.map_or(INITIAL_VERSION, |version| version + 1)
}

/// Compare the stored version against what a conditional writer expects
pub fn check_version(
    key: &str,
    expected: Option<u64>,
    actual: Option<u64>,
) -> Result<(), StorageError> {
    if expected != actual {
        return Err(StorageError::VersionConflict {
            key: key.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Key-value ledger store shared by every ledger operation
///
/// Values are opaque bytes. Every key carries a version that is bumped on each
/// write so that read-modify-write callers can fence their updates with
/// [`LedgerStore::put_if_version`].
pub trait LedgerStore: Debug + Send + Sync {
    /// Get a value and its version
    ///
    /// # Parameters
    /// * `key` - The ledger key to read
    ///
    /// # Returns
    /// Some(value) if the key exists, None otherwise
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError>;

    /// Write a value regardless of the stored version
    ///
    /// # Parameters
    /// * `key` - The ledger key to write
    /// * `value` - The record bytes
    ///
    /// # Returns
    /// The version of the key after the write
    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError>;

    /// Write a value only if the key is still at the expected version
    ///
    /// # Parameters
    /// * `key` - The ledger key to write
    /// * `value` - The record bytes
    /// * `expected` - The version the caller read, or None if the key must be absent
    ///
    /// # Returns
    /// The version of the key after the write, or `StorageError::VersionConflict`
    /// if another writer got there first
    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError>;

    /// List every key in the store
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Get a value, treating absence as an error
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        self.get_versioned(key)?
            .map(|versioned| versioned.value)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Check whether a key has ever been written
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get_versioned(key)?.is_some())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        (**self).get_versioned(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        (**self).put(key, value)
    }

    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError> {
        (**self).put_if_version(key, value, expected)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for std::sync::Arc<S> {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        (**self).get_versioned(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        (**self).put(key, value)
    }

    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError> {
        (**self).put_if_version(key, value, expected)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

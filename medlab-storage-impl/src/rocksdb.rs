#![cfg(feature = "rocksdb")]

use crate::storage_traits::{check_version, next_version, validate_key, LedgerStore, VersionedValue};
use medlab_core::error::StorageError;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, DB};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

// Column family holding bincode-encoded VersionedValue envelopes
const CF_STATE: &str = "ledger_state";

/// RocksDB implementation of LedgerStore
pub struct RocksDbLedgerStore {
    db: Arc<DB>,
    db_path: PathBuf,
    // Serializes read-compare-write so versions are assigned one writer at a time
    write_lock: Mutex<()>,
}

impl RocksDbLedgerStore {
    /// Creates a new RocksDB ledger store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_path_buf();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_state = ColumnFamilyDescriptor::new(CF_STATE, Options::default());
        let db = DB::open_cf_descriptors(&opts, &db_path, vec![cf_state])?;

        log::debug!("Opened RocksDB ledger store at {:?}", db_path);

        Ok(Self {
            db: Arc::new(db),
            db_path,
            write_lock: Mutex::new(()),
        })
    }

    fn read(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &[u8], version: u64) -> Result<u64, StorageError> {
        let cf = self.cf()?;
        let envelope = bincode::serialize(&VersionedValue::new(value.to_vec(), version))?;
        self.db.put_cf(cf, key.as_bytes(), envelope)?;
        Ok(version)
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| StorageError::Database(format!("Missing column family {}", CF_STATE)))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StorageError> {
        self.write_lock
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire write lock: {}", e)))
    }
}

impl LedgerStore for RocksDbLedgerStore {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        validate_key(key)?;
        self.read(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        validate_key(key)?;
        let _guard = self.lock()?;
        let version = next_version(self.read(key)?.map(|v| v.version));
        self.write(key, value, version)
    }

    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError> {
        validate_key(key)?;
        let _guard = self.lock()?;
        let actual = self.read(key)?.map(|v| v.version);
        check_version(key, expected, actual)?;
        self.write(key, value, next_version(actual))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let cf = self.cf()?;
        let mut keys = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            keys.push(key);
        }
        Ok(keys)
    }
}

impl Debug for RocksDbLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbLedgerStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

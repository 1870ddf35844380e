use anyhow::Context;
use medlab_core::error::StorageError;
use medlab_storage_impl::{LedgerStore, MemoryLedgerStore};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_MAX_RETRIES: u32 = 64;

/// How read-modify-write updates of the singleton records are protected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FencingMode {
    /// Conditional writes on the version that was read, retried on conflict
    Optimistic { max_retries: u32 },

    /// Plain read-then-write; concurrent updates of the same singleton can be lost
    Disabled,
}

impl Default for FencingMode {
    fn default() -> Self {
        FencingMode::Optimistic {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl FencingMode {
    /// Total number of write attempts an update may make
    pub fn max_attempts(&self) -> u32 {
        match self {
            FencingMode::Optimistic { max_retries } => max_retries.saturating_add(1),
            FencingMode::Disabled => 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, FencingMode::Optimistic { .. })
    }
}

/// Which ledger store backend to open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite { path: PathBuf },
    Rocksdb { path: PathBuf },
}

impl StoreConfig {
    /// Open the configured backend
    pub fn open(&self) -> Result<Box<dyn LedgerStore>, StorageError> {
        match self {
            StoreConfig::Memory => Ok(Box::new(MemoryLedgerStore::new())),

            #[cfg(feature = "sqlite")]
            StoreConfig::Sqlite { path } => Ok(Box::new(
                medlab_storage_impl::SqliteLedgerStore::new(path)?,
            )),
            #[cfg(not(feature = "sqlite"))]
            StoreConfig::Sqlite { .. } => Err(StorageError::Other(
                "SQLite support was not compiled in".to_string(),
            )),

            #[cfg(feature = "rocksdb")]
            StoreConfig::Rocksdb { path } => Ok(Box::new(
                medlab_storage_impl::RocksDbLedgerStore::new(path)?,
            )),
            #[cfg(not(feature = "rocksdb"))]
            StoreConfig::Rocksdb { .. } => Err(StorageError::Other(
                "RocksDB support was not compiled in".to_string(),
            )),
        }
    }
}

/// Ledger settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub fencing: FencingMode,
    pub store: StoreConfig,
}

impl LedgerConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    pub fn with_fencing(mut self, fencing: FencingMode) -> Self {
        self.fencing = fencing;
        self
    }

    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger config {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse ledger config {:?}", path))
    }
}

pub mod memory;
pub mod storage_traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "rocksdb")]
pub mod rocksdb;

// Re-export the main types for convenience
pub use memory::MemoryLedgerStore;
pub use storage_traits::{LedgerStore, VersionedValue, INITIAL_VERSION};

// Re-export the storage implementations
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLedgerStore;

#[cfg(feature = "rocksdb")]
pub use self::rocksdb::RocksDbLedgerStore;

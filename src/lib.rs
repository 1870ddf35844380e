//! Supply-chain custody ledger for pharmaceutical shipping containers.
//!
//! Containers hold a fixed 3x3x3 tree of pallets, cases and dosage units.
//! The ledger hands out their IDs, records each shipment in the container's
//! provenance, and keeps an index of which holder currently owns which
//! containers. All state lives in an injected [`LedgerStore`].

pub mod allocator;
pub mod chaincode;
pub mod config;
pub mod custody;
pub mod dispatch;
pub mod hierarchy;
pub mod owners;
pub mod query;
pub mod records;

// Re-export the main types for convenience
pub use allocator::IdAllocator;
pub use chaincode::{Chaincode, SUCCESS};
pub use config::{FencingMode, LedgerConfig, StoreConfig};
pub use custody::{CustodyTracker, ShipmentRequest};
pub use dispatch::{Operation, OperationKind};
pub use hierarchy::{build_hierarchy, HierarchyGenerator};
pub use owners::OwnerIndex;
pub use query::QueryFacade;
pub use records::RecordStore;

pub use medlab_core::{
    Container, ContainerId, ContainerOwners, LedgerError, LedgerRecord, LedgerResult, Shipment,
    StorageError, UniqueIdCounter,
};
pub use medlab_storage_impl::{LedgerStore, MemoryLedgerStore, VersionedValue};

#[cfg(feature = "sqlite")]
pub use medlab_storage_impl::SqliteLedgerStore;

#[cfg(feature = "rocksdb")]
pub use medlab_storage_impl::RocksDbLedgerStore;

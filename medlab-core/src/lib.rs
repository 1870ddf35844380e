pub mod error;
pub mod id;
pub mod objects;

// Re-export the main types for convenience
pub use error::{LedgerError, LedgerResult, StorageError};
pub use id::ContainerId;
pub use objects::{
    Case, ChainActivity, Container, ContainerElements, ContainerOwners, ContainerProvenance,
    LedgerRecord, Owner, Pallet, Shipment, UniqueIdCounter, Unit, CONTAINER_OWNER, FAN_OUT,
    STATUS_SHIPPED, UNIQUE_ID_COUNTER,
};

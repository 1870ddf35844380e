use crate::records::RecordStore;
use log::{debug, info};
use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::id::ContainerId;
use medlab_core::objects::{ContainerOwners, CONTAINER_OWNER};
use medlab_storage_impl::LedgerStore;

/// Secondary index from holder to the containers attributed to them,
/// kept in the `ContainerOwner` singleton
pub struct OwnerIndex<'a, S: ?Sized> {
    records: RecordStore<'a, S>,
}

impl<'a, S: LedgerStore + ?Sized> OwnerIndex<'a, S> {
    pub fn new(records: RecordStore<'a, S>) -> Self {
        Self { records }
    }

    /// Create an empty index unless one already exists
    ///
    /// Returns `true` if a new index was written.
    pub fn ensure_initialized(&self) -> LedgerResult<bool> {
        let created = self
            .records
            .create(CONTAINER_OWNER, &ContainerOwners::default())?;
        if created {
            info!("Initialized empty {}", CONTAINER_OWNER);
        }
        Ok(created)
    }

    /// Attribute a container to an owner. Idempotent: a container already in
    /// the owner's list is not added again.
    pub fn add_ownership(&self, owner_id: &str, container_id: &ContainerId) -> LedgerResult<()> {
        if owner_id.is_empty() {
            return Err(LedgerError::InvalidArgument("owner ID is empty".to_string()));
        }
        if container_id.is_empty() {
            return Err(LedgerError::InvalidArgument("container ID is empty".to_string()));
        }

        self.records
            .update::<ContainerOwners, _>(CONTAINER_OWNER, |index| {
                Ok(index.attribute(owner_id, container_id.clone()))
            })?;
        debug!("Attributed {} to owner {}", container_id, owner_id);
        Ok(())
    }

    /// Containers attributed to an owner, in the order they were added
    pub fn list_containers_for(&self, owner_id: &str) -> LedgerResult<Vec<ContainerId>> {
        let index: ContainerOwners = self.records.read(CONTAINER_OWNER)?;
        index
            .find(owner_id)
            .map(|owner| owner.container_list.clone())
            .ok_or_else(|| LedgerError::NotFound(format!("owner {}", owner_id)))
    }

    /// The whole index
    pub fn snapshot(&self) -> LedgerResult<ContainerOwners> {
        self.records.read(CONTAINER_OWNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use medlab_storage_impl::MemoryLedgerStore;
    use std::sync::Arc;
    use std::thread;

    fn ids(raw: &[&str]) -> Vec<ContainerId> {
        raw.iter().map(|id| ContainerId::from(*id)).collect()
    }

    #[test]
    fn test_add_before_initialize_is_not_found() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let owners = OwnerIndex::new(RecordStore::new(&store, &config));

        assert!(matches!(
            owners.add_ownership("A", &ContainerId::new("CON1")),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_ensure_initialized_keeps_existing_owners() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let owners = OwnerIndex::new(RecordStore::new(&store, &config));

        assert!(owners.ensure_initialized().unwrap());
        owners.add_ownership("A", &ContainerId::new("CON1")).unwrap();
        assert!(!owners.ensure_initialized().unwrap());
        assert_eq!(owners.list_containers_for("A").unwrap(), ids(&["CON1"]));
    }

    #[test]
    fn test_owner_dedupe() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let owners = OwnerIndex::new(RecordStore::new(&store, &config));
        owners.ensure_initialized().unwrap();

        owners.add_ownership("A", &ContainerId::new("CON1")).unwrap();
        owners.add_ownership("A", &ContainerId::new("CON1")).unwrap();

        assert_eq!(owners.list_containers_for("A").unwrap(), ids(&["CON1"]));
        assert_eq!(owners.snapshot().unwrap().owners.len(), 1);
    }

    #[test]
    fn test_lists_keep_insertion_order_per_owner() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let owners = OwnerIndex::new(RecordStore::new(&store, &config));
        owners.ensure_initialized().unwrap();

        owners.add_ownership("A", &ContainerId::new("CON2")).unwrap();
        owners.add_ownership("B", &ContainerId::new("CON1")).unwrap();
        owners.add_ownership("A", &ContainerId::new("CON1")).unwrap();

        assert_eq!(owners.list_containers_for("A").unwrap(), ids(&["CON2", "CON1"]));
        assert_eq!(owners.list_containers_for("B").unwrap(), ids(&["CON1"]));
        assert!(matches!(
            owners.list_containers_for("C"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_arguments_are_rejected() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let owners = OwnerIndex::new(RecordStore::new(&store, &config));
        owners.ensure_initialized().unwrap();

        assert!(matches!(
            owners.add_ownership("", &ContainerId::new("CON1")),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            owners.add_ownership("A", &ContainerId::default()),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_concurrent_adds_are_all_kept() {
        let store = Arc::new(MemoryLedgerStore::new());
        let config = Arc::new(LedgerConfig::default());
        OwnerIndex::new(RecordStore::new(&*store, &*config))
            .ensure_initialized()
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                let config = Arc::clone(&config);
                thread::spawn(move || {
                    let owners = OwnerIndex::new(RecordStore::new(&*store, &*config));
                    for i in 0..25 {
                        owners
                            .add_ownership(&format!("owner-{}", t), &ContainerId::new(format!("CON{}", i)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let owners = OwnerIndex::new(RecordStore::new(&*store, &*config));
        for t in 0..4 {
            assert_eq!(owners.list_containers_for(&format!("owner-{}", t)).unwrap().len(), 25);
        }
    }
}

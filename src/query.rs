use crate::allocator::IdAllocator;
use crate::custody::CustodyTracker;
use crate::hierarchy::HierarchyGenerator;
use crate::owners::OwnerIndex;
use crate::records::RecordStore;
use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::objects::{LedgerRecord, Shipment, UniqueIdCounter, UNIQUE_ID_COUNTER};
use medlab_storage_impl::LedgerStore;

/// Read-only reporting over the ledger
pub struct QueryFacade<'a, S: ?Sized> {
    records: RecordStore<'a, S>,
}

impl<'a, S: LedgerStore + ?Sized> QueryFacade<'a, S> {
    pub fn new(records: RecordStore<'a, S>) -> Self {
        Self { records }
    }

    pub fn get_container_details(&self, container_id: &str) -> LedgerResult<Vec<u8>> {
        CustodyTracker::new(self.records).get(container_id)
    }

    /// The counter record exactly as stored, after checking it decodes
    pub fn get_max_id_snapshot(&self) -> LedgerResult<Vec<u8>> {
        let raw = self.records.read_raw(UNIQUE_ID_COUNTER)?;
        UniqueIdCounter::from_bytes(&raw)?;
        Ok(raw)
    }

    pub fn get_empty_container_template(&self) -> LedgerResult<Vec<u8>> {
        HierarchyGenerator::new(IdAllocator::new(self.records))
            .build_empty_container()?
            .to_bytes()
    }

    /// Every container attributed to an owner, in the owner's stored order
    pub fn get_manifest_for_owner(&self, owner_id: &str) -> LedgerResult<Shipment> {
        let container_ids = OwnerIndex::new(self.records).list_containers_for(owner_id)?;
        if container_ids.is_empty() {
            return Err(LedgerError::NotFound(format!(
                "owner {} holds no containers",
                owner_id
            )));
        }

        let custody = CustodyTracker::new(self.records);
        let containers = container_ids
            .iter()
            .map(|container_id| custody.get_container(container_id))
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Shipment { containers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::custody::ShipmentRequest;
    use medlab_core::id::ContainerId;
    use medlab_core::objects::{Container, ContainerOwners, Owner, CONTAINER_OWNER};
    use medlab_storage_impl::MemoryLedgerStore;

    fn bootstrap(store: &MemoryLedgerStore, config: &LedgerConfig) {
        let records = RecordStore::new(store, config);
        IdAllocator::new(records).initialize().unwrap();
        OwnerIndex::new(records).ensure_initialized().unwrap();
    }

    fn ship_next(store: &MemoryLedgerStore, config: &LedgerConfig, sender: &str) -> ContainerId {
        let query = QueryFacade::new(RecordStore::new(store, config));
        let payload = query.get_empty_container_template().unwrap();
        CustodyTracker::new(RecordStore::new(store, config))
            .ship(ShipmentRequest {
                sender_id: sender,
                logistics_id: "L",
                receiver_id: "B",
                remarks: "",
                payload: &payload,
            })
            .unwrap()
    }

    #[test]
    fn test_manifest_ordering() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        bootstrap(&store, &config);

        let c1 = ship_next(&store, &config, "O");
        let other = ship_next(&store, &config, "P");
        let c2 = ship_next(&store, &config, "O");
        assert_eq!((c1.as_str(), other.as_str(), c2.as_str()), ("CON1", "CON2", "CON3"));

        let query = QueryFacade::new(RecordStore::new(&store, &config));
        let manifest = query.get_manifest_for_owner("O").unwrap();
        let ids: Vec<_> = manifest.containers.iter().map(|c| c.container_id.clone()).collect();
        assert_eq!(ids, vec![c1, c2]);
        assert!(manifest.containers.iter().all(|c| c.recipient == "B"));
    }

    #[test]
    fn test_manifest_for_unknown_owner_is_not_found() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        bootstrap(&store, &config);

        let query = QueryFacade::new(RecordStore::new(&store, &config));
        assert!(matches!(
            query.get_manifest_for_owner("nobody"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_manifest_with_empty_list_is_not_found() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let records = RecordStore::new(&store, &config);
        records
            .write(
                CONTAINER_OWNER,
                &ContainerOwners {
                    owners: vec![Owner {
                        owner_id: "O".to_string(),
                        container_list: Vec::new(),
                    }],
                },
            )
            .unwrap();

        let query = QueryFacade::new(records);
        assert!(matches!(
            query.get_manifest_for_owner("O"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_manifest_with_missing_container_is_not_found() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        bootstrap(&store, &config);
        let records = RecordStore::new(&store, &config);
        OwnerIndex::new(records)
            .add_ownership("O", &ContainerId::new("CON404"))
            .unwrap();

        let query = QueryFacade::new(records);
        assert!(matches!(
            query.get_manifest_for_owner("O"),
            Err(LedgerError::NotFound(ref key)) if key == "CON404"
        ));
    }

    #[test]
    fn test_max_id_snapshot_is_raw_record() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let query = QueryFacade::new(RecordStore::new(&store, &config));
        assert!(matches!(query.get_max_id_snapshot(), Err(LedgerError::NotFound(_))));

        bootstrap(&store, &config);
        ship_next(&store, &config, "O");

        let raw = query.get_max_id_snapshot().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json, serde_json::json!({"ContainerMaxID": 1, "PalletMaxID": 3}));

        store.put(UNIQUE_ID_COUNTER, b"[]").unwrap();
        assert!(matches!(
            query.get_max_id_snapshot(),
            Err(LedgerError::Deserialization(_))
        ));
    }

    #[test]
    fn test_template_is_encoded_container() {
        let store = MemoryLedgerStore::new();
        let config = LedgerConfig::default();
        bootstrap(&store, &config);

        let query = QueryFacade::new(RecordStore::new(&store, &config));
        let template = Container::from_bytes(&query.get_empty_container_template().unwrap()).unwrap();
        assert_eq!(template.container_id.as_str(), "CON1");
        assert_eq!(template.elements.pallets[2].pallet_id, "CON1-PAL3");
    }
}

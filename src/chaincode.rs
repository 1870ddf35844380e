use crate::allocator::IdAllocator;
use crate::config::LedgerConfig;
use crate::custody::{CustodyTracker, ShipmentRequest};
use crate::dispatch::{Operation, OperationKind};
use crate::hierarchy::HierarchyGenerator;
use crate::owners::OwnerIndex;
use crate::query::QueryFacade;
use crate::records::RecordStore;
use anyhow::Context;
use log::{debug, info, warn};
use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::objects::LedgerRecord;
use medlab_storage_impl::LedgerStore;

/// Literal returned by `SetCurrentOwner`
pub const SUCCESS: &[u8] = b"success";

/// The ledger handler: owns the injected store and routes operations to the
/// components
#[derive(Debug)]
pub struct Chaincode<S> {
    store: S,
    config: LedgerConfig,
}

impl Chaincode<Box<dyn LedgerStore>> {
    /// Open the store named by the configuration
    pub fn open(config: LedgerConfig) -> anyhow::Result<Self> {
        let store = config
            .store
            .open()
            .with_context(|| format!("Failed to open ledger store {:?}", config.store))?;
        Ok(Self::with_config(store, config))
    }
}

impl<S: LedgerStore> Chaincode<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn records(&self) -> RecordStore<'_, S> {
        RecordStore::new(&self.store, &self.config)
    }

    pub fn allocator(&self) -> IdAllocator<'_, S> {
        IdAllocator::new(self.records())
    }

    pub fn hierarchy(&self) -> HierarchyGenerator<'_, S> {
        HierarchyGenerator::new(self.allocator())
    }

    pub fn custody(&self) -> CustodyTracker<'_, S> {
        CustodyTracker::new(self.records())
    }

    pub fn owners(&self) -> OwnerIndex<'_, S> {
        OwnerIndex::new(self.records())
    }

    pub fn queries(&self) -> QueryFacade<'_, S> {
        QueryFacade::new(self.records())
    }

    /// Bootstrap entry point; only `init` is routed here
    pub fn init<A: AsRef<str>>(&self, function: &str, args: &[A]) -> LedgerResult<Vec<u8>> {
        self.route(OperationKind::Init, function, args)
    }

    /// Entry point for operations that write the ledger
    pub fn invoke<A: AsRef<str>>(&self, function: &str, args: &[A]) -> LedgerResult<Vec<u8>> {
        self.route(OperationKind::Invoke, function, args)
    }

    /// Entry point for read-only operations
    pub fn query<A: AsRef<str>>(&self, function: &str, args: &[A]) -> LedgerResult<Vec<u8>> {
        self.route(OperationKind::Query, function, args)
    }

    fn route<A: AsRef<str>>(
        &self,
        kind: OperationKind,
        function: &str,
        args: &[A],
    ) -> LedgerResult<Vec<u8>> {
        debug!("{} is running {}", kind, function);
        let operation = Operation::parse(function, args).map_err(|e| {
            warn!("{} rejected {}: {}", kind, function, e);
            e
        })?;

        if operation.kind() != kind {
            warn!("{} did not find func: {}", kind, function);
            return Err(LedgerError::UnknownOperation(function.to_string()));
        }
        self.execute(operation)
    }

    /// Run an already parsed operation
    pub fn execute(&self, operation: Operation) -> LedgerResult<Vec<u8>> {
        match operation {
            Operation::Init => {
                self.allocator().initialize()?;
                self.owners().ensure_initialized()?;
                info!("Ledger initialized");
                Ok(Vec::new())
            }
            Operation::ShipContainerUsingLogistics {
                sender_id,
                logistics_id,
                receiver_id,
                remarks,
                payload,
            } => {
                let container_id = self.custody().ship(ShipmentRequest {
                    sender_id: &sender_id,
                    logistics_id: &logistics_id,
                    receiver_id: &receiver_id,
                    remarks: &remarks,
                    payload: payload.as_bytes(),
                })?;
                Ok(container_id.into_inner().into_bytes())
            }
            Operation::SetCurrentOwner {
                owner_id,
                container_id,
            } => {
                self.owners().add_ownership(&owner_id, &container_id)?;
                Ok(SUCCESS.to_vec())
            }
            Operation::GetContainerDetails { container_id } => {
                self.queries().get_container_details(&container_id)
            }
            Operation::GetMaxIdValue => self.queries().get_max_id_snapshot(),
            Operation::GetEmptyContainer => self.queries().get_empty_container_template(),
            Operation::GetContainerDetailsForOwner { owner_id } => {
                self.queries().get_manifest_for_owner(&owner_id)?.to_bytes()
            }
        }
    }
}

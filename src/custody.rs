use crate::allocator::IdAllocator;
use crate::owners::OwnerIndex;
use crate::records::RecordStore;
use log::{debug, info};
use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::id::ContainerId;
use medlab_core::objects::{ChainActivity, Container, ContainerProvenance, LedgerRecord, STATUS_SHIPPED};
use medlab_storage_impl::LedgerStore;

/// Parties and payload of a shipment
#[derive(Debug, Clone, Copy)]
pub struct ShipmentRequest<'r> {
    /// Party handing the container over; recorded as its current holder
    pub sender_id: &'r str,
    /// Carrier taking the container
    pub logistics_id: &'r str,
    /// Final addressee, stored as the container's recipient
    pub receiver_id: &'r str,
    /// Free text from the caller. The payload's own `remarks` field is what
    /// gets stored.
    pub remarks: &'r str,
    /// JSON-encoded container, usually a filled-in template
    pub payload: &'r [u8],
}

/// Stamp a decoded container with its shipment: recipient plus a fresh
/// single-hop provenance.
///
/// Any provenance carried by the payload is replaced, not extended.
pub fn stamp_shipment(container: &mut Container, sender_id: &str, logistics_id: &str, receiver_id: &str) {
    container.recipient = receiver_id.to_string();
    container.provenance =
        ContainerProvenance::single_hop(ChainActivity::new(sender_id, logistics_id, STATUS_SHIPPED));
}

/// Records custody changes on container records
pub struct CustodyTracker<'a, S: ?Sized> {
    records: RecordStore<'a, S>,
}

impl<'a, S: LedgerStore + ?Sized> CustodyTracker<'a, S> {
    pub fn new(records: RecordStore<'a, S>) -> Self {
        Self { records }
    }

    /// Ship a caller-built container.
    ///
    /// Writes the container record, then advances the ID counter, then
    /// attributes the container to the sender in the owner index. A failure
    /// part-way leaves the earlier writes in place.
    pub fn ship(&self, request: ShipmentRequest<'_>) -> LedgerResult<ContainerId> {
        let mut container = Container::from_bytes(request.payload)?;
        if container.container_id.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "shipment payload has no container_id".to_string(),
            ));
        }

        stamp_shipment(
            &mut container,
            request.sender_id,
            request.logistics_id,
            request.receiver_id,
        );
        debug!(
            "Shipping {} from {} via {} (remarks: {:?})",
            container.container_id, request.sender_id, request.logistics_id, request.remarks
        );

        let container_id = container.container_id.clone();
        self.records.write(&container_id, &container)?;

        IdAllocator::new(self.records).advance()?;
        OwnerIndex::new(self.records).add_ownership(request.sender_id, &container_id)?;

        info!(
            "Shipped {} from {} to {} via {}",
            container_id, request.sender_id, request.receiver_id, request.logistics_id
        );
        Ok(container_id)
    }

    /// Raw stored record of a container
    pub fn get(&self, container_id: &str) -> LedgerResult<Vec<u8>> {
        if container_id.is_empty() {
            return Err(LedgerError::NotFound("empty container ID".to_string()));
        }
        self.records.read_raw(container_id)
    }

    /// Decoded record of a container
    pub fn get_container(&self, container_id: &str) -> LedgerResult<Container> {
        Container::from_bytes(&self.get(container_id)?)
    }
}

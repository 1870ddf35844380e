use crate::records::RecordStore;
use log::info;
use medlab_core::error::LedgerResult;
use medlab_core::objects::{UniqueIdCounter, UNIQUE_ID_COUNTER};
use medlab_storage_impl::LedgerStore;

/// Hands out container and pallet number ranges from the `UniqueIDCounter` singleton
pub struct IdAllocator<'a, S: ?Sized> {
    records: RecordStore<'a, S>,
}

impl<'a, S: LedgerStore + ?Sized> IdAllocator<'a, S> {
    pub fn new(records: RecordStore<'a, S>) -> Self {
        Self { records }
    }

    /// Reset the counter to zero.
    ///
    /// Bootstrap only: running this on a ledger that already holds containers
    /// makes the next template reuse their IDs.
    pub fn initialize(&self) -> LedgerResult<()> {
        self.records
            .write(UNIQUE_ID_COUNTER, &UniqueIdCounter::default())?;
        info!("Initialized {} to zero", UNIQUE_ID_COUNTER);
        Ok(())
    }

    /// Current counter, `NotFound` if the ledger was never initialized
    pub fn peek(&self) -> LedgerResult<UniqueIdCounter> {
        self.records.read(UNIQUE_ID_COUNTER)
    }

    /// Claim one container and its three pallets
    pub fn advance(&self) -> LedgerResult<UniqueIdCounter> {
        self.records
            .update::<UniqueIdCounter, _>(UNIQUE_ID_COUNTER, |counter| {
                *counter = counter.advanced();
                Ok(true)
            })
    }
}

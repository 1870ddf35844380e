use crate::allocator::IdAllocator;
use log::debug;
use medlab_core::error::LedgerResult;
use medlab_core::id::{self, ContainerId};
use medlab_core::objects::{Case, Container, ContainerElements, Pallet, Unit, FAN_OUT};
use medlab_storage_impl::LedgerStore;

/// Build the fixed 3x3x3 packaging tree of a container.
///
/// Pallets take consecutive numbers from the global pallet sequence starting
/// at `pallet_base`; cases and units are numbered 1..=3 within their parent.
pub fn build_hierarchy(container_id: &ContainerId, pallet_base: u64) -> ContainerElements {
    let pallets = (0..FAN_OUT as u64)
        .map(|offset| {
            let pallet_id = id::pallet_id(container_id, pallet_base + offset);
            let cases = build_cases(&pallet_id);
            Pallet { pallet_id, cases }
        })
        .collect();

    ContainerElements { pallets }
}

fn build_cases(pallet_id: &str) -> Vec<Case> {
    (1..=FAN_OUT)
        .map(|index| {
            let case_id = id::case_id(pallet_id, index);
            let units = build_units(&case_id);
            Case { case_id, units }
        })
        .collect()
}

fn build_units(case_id: &str) -> Vec<Unit> {
    (1..=FAN_OUT)
        .map(|index| Unit::new(id::unit_id(case_id, index)))
        .collect()
}

/// Produces empty container templates for clients to fill in and ship
pub struct HierarchyGenerator<'a, S: ?Sized> {
    allocator: IdAllocator<'a, S>,
}

impl<'a, S: LedgerStore + ?Sized> HierarchyGenerator<'a, S> {
    pub fn new(allocator: IdAllocator<'a, S>) -> Self {
        Self { allocator }
    }

    /// Template for the next container, numbered from the current counter.
    ///
    /// Does not advance the counter: the IDs are only claimed when the
    /// container is shipped.
    pub fn build_empty_container(&self) -> LedgerResult<Container> {
        let counter = self.allocator.peek()?;
        let container_id = ContainerId::from_sequence(counter.next_container_sequence());
        let elements = build_hierarchy(&container_id, counter.next_pallet_base());
        debug!("Built empty container template {}", container_id);
        Ok(Container::with_elements(container_id, elements))
    }
}

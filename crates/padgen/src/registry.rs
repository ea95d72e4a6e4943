use ahash::AHashMap;
use smallvec::SmallVec;

use crate::device::DeviceRecord;
use crate::ident::Backend;

/// Opaque identity of a live device. A handle is an arena slot plus the
/// generation the slot had when the record was created, so a handle to a
/// destroyed device can never resolve again; not even if the slot is
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    slot: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    record: Option<DeviceRecord>,
}

/// The central device store: a generational arena with a secondary index
/// that enforces one record per (backend, index) pair. Absence is a normal
/// answer everywhere; no lookup fails loudly.
#[derive(Default)]
pub(crate) struct DeviceRegistry {
    slots: Vec<Slot>,
    by_address: AHashMap<(Backend, u8), u32>,
}

impl DeviceRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, handle: DeviceHandle) -> Option<&DeviceRecord> {
        let slot = self.slots.get(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.record.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: DeviceHandle) -> Option<&mut DeviceRecord> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.record.as_mut()
    }

    /// Looks a handle up by backend address.
    pub(crate) fn find(&self, backend: Backend, index: u8) -> Option<DeviceHandle> {
        let &slot = self.by_address.get(&(backend, index))?;
        Some(DeviceHandle {
            slot,
            generation: self.slots[slot as usize].generation,
        })
    }

    /// Inserts a record for an address, or returns the live handle if one
    /// already exists (creation is idempotent per address).
    pub(crate) fn create(&mut self, backend: Backend, index: u8) -> DeviceHandle {
        if let Some(handle) = self.find(backend, index) {
            return handle;
        }

        let record = DeviceRecord::new(backend, index);
        let slot = match self.slots.iter().position(|s| s.record.is_none()) {
            Some(free) => {
                self.slots[free].record = Some(record);
                free as u32
            }
            None => {
                self.slots.push(Slot { generation: 0, record: Some(record) });
                (self.slots.len() - 1) as u32
            }
        };
        self.by_address.insert((backend, index), slot);
        DeviceHandle {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    /// Takes a record out, bumping the slot generation so the handle goes
    /// stale. A stale or unknown handle is a no-op.
    pub(crate) fn remove(&mut self, handle: DeviceHandle) -> Option<DeviceRecord> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.by_address.remove(&(record.backend, record.index));
        Some(record)
    }

    /// Snapshot of every live handle. Detached from the arena so records
    /// can be destroyed while iterating.
    pub(crate) fn handles(&self) -> SmallVec<[DeviceHandle; 8]> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.record.is_some())
            .map(|(i, s)| DeviceHandle { slot: i as u32, generation: s.generation })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_address.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_find_returns_the_same_handle() {
        let mut registry = DeviceRegistry::new();
        let handle = registry.create(Backend::GenericXbox, 1);
        assert_eq!(registry.find(Backend::GenericXbox, 1), Some(handle));
    }

    #[test]
    fn create_is_idempotent_per_address() {
        let mut registry = DeviceRegistry::new();
        let first = registry.create(Backend::LegacyBus, 2);
        let second = registry.create(Backend::LegacyBus, 2);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_addresses_get_distinct_handles() {
        let mut registry = DeviceRegistry::new();
        let a = registry.create(Backend::LegacyJoystick, 1);
        let b = registry.create(Backend::GenericXbox, 1);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn removed_handle_goes_stale() {
        let mut registry = DeviceRegistry::new();
        let handle = registry.create(Backend::GenericDs4, 3);
        assert!(registry.remove(handle).is_some());
        assert!(registry.get(handle).is_none());
        assert!(registry.remove(handle).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn slot_reuse_does_not_revive_stale_handles() {
        let mut registry = DeviceRegistry::new();
        let old = registry.create(Backend::GenericXbox, 1);
        registry.remove(old);
        let new = registry.create(Backend::GenericXbox, 1);
        assert!(registry.get(old).is_none());
        assert!(registry.get(new).is_some());
        assert_ne!(old, new);
    }

    #[test]
    fn handles_snapshot_survives_destruction_mid_iteration() {
        let mut registry = DeviceRegistry::new();
        registry.create(Backend::LegacyJoystick, 1);
        registry.create(Backend::LegacyBus, 1);
        registry.create(Backend::GenericDs4, 1);
        let snapshot = registry.handles();
        assert_eq!(snapshot.len(), 3);
        for handle in snapshot {
            assert!(registry.remove(handle).is_some());
        }
        assert!(registry.is_empty());
    }
}

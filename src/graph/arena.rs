//! Fixed-capacity slot table.
//!
//! Storage is allocated once at construction. The live set and the free set
//! are kept beside the slot array, so allocation picks the lowest free index
//! without scanning and iteration visits live slots in index order.

use super::id::{next_generation, TableHandle};
use std::collections::BTreeSet;
use std::marker::PhantomData;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena of at most `capacity` values addressed by generation-tagged handles.
pub struct SlotTable<H, T> {
    slots: Vec<Slot<T>>,
    live: BTreeSet<usize>,
    free: BTreeSet<usize>,
    _handle: PhantomData<H>,
}

impl<H: TableHandle, T> SlotTable<H, T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        Self {
            slots,
            live: BTreeSet::new(),
            free: (0..capacity).collect(),
            _handle: PhantomData,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Store `value` in the lowest free slot. Returns `None` when full.
    pub fn insert(&mut self, value: T) -> Option<H> {
        let index = self.free.pop_first()?;
        let slot = &mut self.slots[index];
        slot.value = Some(value);
        self.live.insert(index);
        Some(H::from_parts(index, slot.generation))
    }

    /// Remove the value behind `handle`, bumping the slot generation.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let index = handle.index();
        let slot = self.slots.get_mut(index)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = next_generation(slot.generation);
        self.live.remove(&index);
        self.free.insert(index);
        Some(value)
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Live handles in slot order.
    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.live.iter().filter_map(move |&index| {
            let slot = &self.slots[index];
            slot.value
                .as_ref()
                .map(|v| (H::from_parts(index, slot.generation), v))
        })
    }

    /// Remove every live value. Generations of occupied slots are bumped.
    pub fn clear(&mut self) {
        for index in std::mem::take(&mut self.live) {
            let slot = &mut self.slots[index];
            slot.value = None;
            slot.generation = next_generation(slot.generation);
            self.free.insert(index);
        }
    }

    /// Drop the value without touching the live/free index.
    ///
    /// Leaves the table inconsistent; only used to fabricate dangling
    /// references in tests.
    #[cfg(test)]
    pub(crate) fn vacate_unchecked(&mut self, handle: H) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            slot.value = None;
            slot.generation = next_generation(slot.generation);
        }
    }
}

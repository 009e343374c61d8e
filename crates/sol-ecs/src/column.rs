//! Dense, generation-checked per-entity storage.
//!
//! A [`ComponentColumn<T>`] is indexed by [`EntityId::index`]. Every slot
//! stores the generation of the entity that wrote it. Reads only succeed for
//! an exact generation match, and a write from a newer generation reclaims the
//! slot in place. Dead entities therefore never need an explicit removal: the
//! recycled index simply overwrites them.

use tracing::trace;

use crate::entity::{generation_is_newer, EntityId};
use crate::EcsError;

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: T,
}

/// Per-entity component storage keyed by generational index.
#[derive(Debug, Clone)]
pub struct ComponentColumn<T> {
    slots: Vec<Option<Slot<T>>>,
    /// Count of `Some` slots, including ones not yet reclaimed.
    occupied: usize,
}

impl<T> ComponentColumn<T> {
    /// Create an empty column.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
        }
    }

    /// Value stored for exactly this entity, if any.
    pub fn get(&self, id: EntityId) -> Option<&T> {
        match self.slots.get(id.index() as usize) {
            Some(Some(slot)) if slot.generation == id.generation() => Some(&slot.value),
            _ => None,
        }
    }

    /// Store `value` for `id`.
    ///
    /// Returns the previous value if the same entity had one. A value left
    /// behind by an older generation is dropped silently.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] if the slot already belongs to a newer
    /// generation than `id`.
    pub fn insert(&mut self, id: EntityId, value: T) -> Result<Option<T>, EcsError> {
        let generation = id.generation();
        let slot = self.slot_for_write(id)?;
        let previous = slot.replace(Slot { generation, value }).map(|s| s.value);
        if previous.is_none() {
            self.occupied += 1;
        }
        Ok(previous)
    }

    /// Mutable access to the value for `id`, inserting `make()` first if the
    /// entity has none (including when the slot held a dead entity's value).
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] if the slot already belongs to a newer
    /// generation than `id`.
    pub fn get_or_insert_with(
        &mut self,
        id: EntityId,
        make: impl FnOnce() -> T,
    ) -> Result<&mut T, EcsError> {
        let idx = id.index() as usize;
        let generation = id.generation();
        if self.slot_for_write(id)?.is_none() {
            self.occupied += 1;
        }
        let slot = self.slots[idx].get_or_insert_with(|| Slot {
            generation,
            value: make(),
        });
        Ok(&mut slot.value)
    }

    /// Remove and return the value for exactly this entity.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if !matches!(slot, Some(s) if s.generation == id.generation()) {
            return None;
        }
        self.occupied -= 1;
        slot.take().map(|s| s.value)
    }

    /// Number of occupied slots. Slots still holding a dead entity's value
    /// count until their index is written again.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Resolve the slot `id` may write to, clearing it if it belonged to an
    /// older generation.
    fn slot_for_write(&mut self, id: EntityId) -> Result<&mut Option<Slot<T>>, EcsError> {
        let idx = id.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        let stored = self.slots[idx].as_ref().map(|s| s.generation);
        if let Some(stored) = stored {
            if stored != id.generation() {
                if generation_is_newer(stored, id.generation()) {
                    return Err(EcsError::StaleEntity {
                        entity: id,
                        current: stored,
                    });
                }
                trace!(
                    index = idx,
                    old_generation = stored,
                    new_generation = id.generation(),
                    "reclaiming column slot from dead entity"
                );
                self.slots[idx] = None;
                self.occupied -= 1;
            }
        }
        Ok(&mut self.slots[idx])
    }
}

impl<T> Default for ComponentColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

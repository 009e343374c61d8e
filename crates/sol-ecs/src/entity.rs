//! Generational entity handles.
//!
//! The simulation owns its entity registry and hands the light engine plain
//! handles. Two entities that occupy the same slot index one after another
//! differ only in their generation, which is all a
//! [`ComponentColumn`](crate::column::ComponentColumn) needs to tell a live
//! entity's state from a dead one's.

use serde::{Deserialize, Serialize};

/// Handle to a simulation entity: a slot index plus the generation that
/// currently owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Handle the next occupant of this slot will receive.
    #[inline]
    pub const fn successor(self) -> Self {
        Self::new(self.index, self.generation.wrapping_add(1))
    }
}

/// Whether generation `a` was issued after `b`. Generations wrap, so the
/// signed distance decides, not the raw values.
#[inline]
pub(crate) fn generation_is_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

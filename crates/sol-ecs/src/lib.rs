//! Sol ECS -- generational entity handles and per-entity component columns.
//!
//! The light engine does not own an entity registry. Callers hand it the
//! [`EntityId`]s their simulation already uses, and the engine keeps its
//! per-entity state in a [`ComponentColumn`]. Each column slot remembers the
//! generation it was written for, so state belonging to a despawned entity is
//! invisible to the next occupant of that index and is overwritten on first
//! write. No cleanup pass is ever needed.
//!
//! # Quick Start
//!
//! ```
//! use sol_ecs::prelude::*;
//!
//! let mut alpha: ComponentColumn<f32> = ComponentColumn::new();
//!
//! let ship = EntityId::new(4, 0);
//! alpha.insert(ship, 0.5).unwrap();
//! assert_eq!(alpha.get(ship), Some(&0.5));
//!
//! // The ship is destroyed and a drone takes over its slot.
//! let drone = ship.successor();
//! assert_eq!(alpha.get(drone), None);
//! ```

#![deny(unsafe_code)]

pub mod column;
pub mod entity;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity and column operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The handle's generation is older than the one stored in its slot.
    #[error("entity {entity:?} is stale (slot now belongs to generation {current})")]
    StaleEntity {
        entity: entity::EntityId,
        current: u32,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::column::ComponentColumn;
    pub use crate::entity::EntityId;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

//! Sol Light -- dynamic 2D light occlusion and visibility.
//!
//! Each frame a handful of moving lights and a larger set of rotating
//! obstacles and moving units are turned into:
//!
//! - boolean answers for gameplay: is a point in shadow, is there a clear
//!   line between two points ([`query`]);
//! - shadow quads for the renderer ([`shadow`]), composited as a boolean clip
//!   ([`composite`]);
//! - smoothly fading per-entity alphas ([`fade`]).
//!
//! Geometry is rebuilt from current transforms every frame ([`occluder`]).
//! Only fade state persists, stored per entity in a
//! [`ComponentColumn`](sol_ecs::column::ComponentColumn).
//!
//! # Quick Start
//!
//! ```
//! use sol_light::prelude::*;
//!
//! let suns = [Light::new(Vec2::new(0.0, 0.0), 50.0)];
//! let rocks = vec![Occluder::polygon(vec![
//!     Vec2::new(40.0, -10.0),
//!     Vec2::new(60.0, -10.0),
//!     Vec2::new(60.0, 10.0),
//!     Vec2::new(40.0, 10.0),
//! ])];
//!
//! let query = OcclusionQuery::new(&suns, &rocks);
//! assert!(query.is_point_in_shadow(Vec2::new(100.0, 0.0)));
//! assert!(query.has_line_of_sight(Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0)));
//!
//! let quads = build_shadow_quads(&suns[0], &rocks, 500.0);
//! assert_eq!(quads.len(), 3);
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod composite;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod fade;
pub mod geometry;
pub mod intersect;
pub mod light;
pub mod occluder;
pub mod query;
pub mod shadow;

/// Re-export the entity crate for convenience.
pub use sol_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the light engine.
///
/// Degenerate geometry is never an error; only setup can fail.
#[derive(Debug, thiserror::Error)]
pub enum LightError {
    /// No drawing surface could be acquired for compositing.
    #[error("drawing surface unavailable; cannot composite shadows")]
    SurfaceUnavailable,

    /// A configuration value is out of range.
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// Configuration JSON could not be parsed.
    #[error("failed to parse light config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::clock::FrameClock;
    pub use crate::composite::{
        CompositePass, CompositeReport, Compositor, CoverageMask, QualityTier, ShadowCanvas,
    };
    pub use crate::config::LightConfig;
    pub use crate::connectivity::{
        feeding_reflectors, reflector_reaches_structure, reflector_sees_light,
        structure_receives_light, Reflector, Structure,
    };
    pub use crate::engine::{FrameSummary, LightingEngine};
    pub use crate::fade::{clamp_step, FadeChannel, FadeController, FadeRates, FadeState};
    pub use crate::geometry::Vec2;
    pub use crate::intersect::{intersect_segment, occlusion_distance};
    pub use crate::light::{Light, SplitSide};
    pub use crate::occluder::{
        extract_occluders, extract_occluders_into, Blocker, BlockerArchetype, Occluder,
        RotatingObstacle,
    };
    pub use crate::query::{OcclusionQuery, ShadowPolicy};
    pub use crate::shadow::{build_shadow_quads, ShadowQuad, ShadowQuadBuilder, ShadowSet};
    pub use crate::LightError;
    pub use sol_ecs::entity::EntityId;
}

//! Occluder extraction.
//!
//! Occluders are rebuilt from current transforms every frame and never cached.
//! Two sources feed the list:
//!
//! - [`RotatingObstacle`]s (asteroids) keep their local-space outline from
//!   creation and are placed into the world as
//!   `position + rotate(local_vertex, rotation)`.
//! - [`Blocker`]s (heroes, reflectors, structures) become oriented rectangles
//!   whose half-size comes from their [`BlockerArchetype`].
//!
//! The result is a closed [`Occluder`] enum rather than a trait object so that
//! the query layer and the quad builder can match on it directly.

use serde::{Deserialize, Serialize};
use sol_ecs::entity::EntityId;
use tracing::{trace, warn};

use crate::geometry::Vec2;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A polygonal obstacle that rotates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotatingObstacle {
    local_vertices: Vec<Vec2>,
    /// World position of the local origin.
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f64,
}

impl RotatingObstacle {
    /// Create an obstacle from its local-space outline.
    pub fn new(local_vertices: Vec<Vec2>, position: Vec2, rotation: f64) -> Self {
        Self {
            local_vertices,
            position,
            rotation,
        }
    }

    /// Regular `sides`-gon of circumradius `radius` centred on the local
    /// origin, wound counter-clockwise.
    pub fn regular(sides: usize, radius: f64, position: Vec2, rotation: f64) -> Self {
        let step = std::f64::consts::TAU / sides.max(1) as f64;
        let local = (0..sides)
            .map(|i| Vec2::from_angle(step * i as f64) * radius)
            .collect();
        Self::new(local, position, rotation)
    }

    /// The outline as supplied at creation.
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.local_vertices
    }

    /// Write this frame's world-space outline into `out`, replacing its
    /// contents.
    pub fn world_vertices_into(&self, out: &mut Vec<Vec2>) {
        let turn = Vec2::from_angle(self.rotation);
        out.clear();
        out.extend(
            self.local_vertices
                .iter()
                .map(|&v| self.position + turn.rotate(v)),
        );
    }

    /// This frame's world-space outline.
    pub fn world_vertices(&self) -> Vec<Vec2> {
        let mut out = Vec::with_capacity(self.local_vertices.len());
        self.world_vertices_into(&mut out);
        out
    }
}

/// Entity archetypes that block light with a fixed rectangular footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockerArchetype {
    Hero,
    Reflector,
    Structure,
}

/// Half-extent of a hero's light-blocking footprint.
pub const HERO_HALF_SIZE: Vec2 = Vec2::new(12.0, 8.0);
/// Half-extent of a reflector panel: long and thin.
pub const REFLECTOR_HALF_SIZE: Vec2 = Vec2::new(20.0, 4.0);
/// Half-extent of a structure's footprint.
pub const STRUCTURE_HALF_SIZE: Vec2 = Vec2::new(40.0, 40.0);

impl BlockerArchetype {
    /// Half-width (along the heading) and half-height (across it).
    pub fn half_size(self) -> Vec2 {
        match self {
            BlockerArchetype::Hero => HERO_HALF_SIZE,
            BlockerArchetype::Reflector => REFLECTOR_HALF_SIZE,
            BlockerArchetype::Structure => STRUCTURE_HALF_SIZE,
        }
    }
}

/// A movable entity that blocks light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    /// The entity this footprint belongs to, so queries about the entity can
    /// ignore its own body.
    pub entity: Option<EntityId>,
    pub position: Vec2,
    /// Facing in radians.
    pub heading: f64,
    pub archetype: BlockerArchetype,
}

impl Blocker {
    pub fn new(position: Vec2, heading: f64, archetype: BlockerArchetype) -> Self {
        Self {
            entity: None,
            position,
            heading,
            archetype,
        }
    }

    /// Attach the owning entity.
    pub fn owned_by(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }
}

// ---------------------------------------------------------------------------
// Occluder
// ---------------------------------------------------------------------------

/// One light-blocking shape for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Occluder {
    /// World-space outline of a rotating obstacle.
    Polygon { vertices: Vec<Vec2> },
    /// Rectangle derived from an entity transform.
    OrientedBlock {
        owner: Option<EntityId>,
        center: Vec2,
        heading: f64,
        half_size: Vec2,
        /// Corners in counter-clockwise order.
        corners: [Vec2; 4],
    },
}

impl Occluder {
    /// A polygon occluder from world-space vertices.
    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Occluder::Polygon { vertices }
    }

    /// A rectangle centred at `center`, rotated by `heading`.
    pub fn oriented_block(center: Vec2, heading: f64, half_size: Vec2) -> Self {
        let local = [
            Vec2::new(-half_size.x, -half_size.y),
            Vec2::new(half_size.x, -half_size.y),
            Vec2::new(half_size.x, half_size.y),
            Vec2::new(-half_size.x, half_size.y),
        ];
        let turn = Vec2::from_angle(heading);
        Occluder::OrientedBlock {
            owner: None,
            center,
            heading,
            half_size,
            corners: local.map(|v| center + turn.rotate(v)),
        }
    }

    /// Build the oriented block for `blocker`.
    pub fn from_blocker(blocker: &Blocker) -> Self {
        let mut occ = Self::oriented_block(
            blocker.position,
            blocker.heading,
            blocker.archetype.half_size(),
        );
        if let Occluder::OrientedBlock { owner, .. } = &mut occ {
            *owner = blocker.entity;
        }
        occ
    }

    /// The closed outline, last vertex joining the first.
    pub fn vertices(&self) -> &[Vec2] {
        match self {
            Occluder::Polygon { vertices } => vertices,
            Occluder::OrientedBlock { corners, .. } => corners,
        }
    }

    /// Entity this occluder was derived from, if any.
    pub fn owner(&self) -> Option<EntityId> {
        match self {
            Occluder::Polygon { .. } => None,
            Occluder::OrientedBlock { owner, .. } => *owner,
        }
    }

    pub fn is_oriented_block(&self) -> bool {
        matches!(self, Occluder::OrientedBlock { .. })
    }

    /// Fewer than three vertices, or any non-finite coordinate.
    pub fn is_degenerate(&self) -> bool {
        let verts = self.vertices();
        verts.len() < 3 || verts.iter().any(|v| !v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Collect this frame's occluders, replacing the contents of `out`.
///
/// Degenerate shapes are dropped here so that no later stage sees them.
pub fn extract_occluders_into(
    obstacles: &[RotatingObstacle],
    blockers: &[Blocker],
    out: &mut Vec<Occluder>,
) {
    out.clear();
    out.reserve(obstacles.len() + blockers.len());

    let mut skipped = 0usize;
    let candidates = obstacles
        .iter()
        .map(|o| Occluder::polygon(o.world_vertices()))
        .chain(blockers.iter().map(Occluder::from_blocker));
    for occ in candidates {
        if occ.is_degenerate() {
            skipped += 1;
            continue;
        }
        out.push(occ);
    }

    if skipped > 0 {
        warn!(skipped, "dropped degenerate occluders");
    }
    trace!(
        obstacles = obstacles.len(),
        blockers = blockers.len(),
        extracted = out.len(),
        "extracted occluders"
    );
}

/// Collect this frame's occluders into a fresh list.
pub fn extract_occluders(obstacles: &[RotatingObstacle], blockers: &[Blocker]) -> Vec<Occluder> {
    let mut out = Vec::new();
    extract_occluders_into(obstacles, blockers, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn obstacle_world_vertices_follow_rotation() {
        let mut rock = RotatingObstacle::new(
            vec![Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(-1.0, 0.0)],
            Vec2::new(10.0, 10.0),
            0.0,
        );
        assert_eq!(rock.world_vertices()[0], Vec2::new(11.0, 10.0));

        rock.rotation = FRAC_PI_2;
        let world = rock.world_vertices();
        assert!(approx(world[0], Vec2::new(10.0, 11.0)));
        assert!(approx(world[1], Vec2::new(9.0, 10.0)));
        assert_eq!(rock.local_vertices()[0], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn oriented_block_corners_rotate_about_center() {
        let occ = Occluder::oriented_block(Vec2::new(5.0, 5.0), FRAC_PI_2, Vec2::new(2.0, 1.0));
        let v = occ.vertices();
        assert_eq!(v.len(), 4);
        assert!(approx(v[0], Vec2::new(6.0, 3.0)));
        assert!(approx(v[2], Vec2::new(4.0, 7.0)));
    }

    #[test]
    fn blocker_uses_archetype_half_size_and_owner() {
        let id = EntityId::new(3, 1);
        let b = Blocker::new(Vec2::ZERO, 0.0, BlockerArchetype::Structure).owned_by(id);
        let occ = Occluder::from_blocker(&b);
        assert_eq!(occ.owner(), Some(id));
        assert!(occ.is_oriented_block());
        assert_eq!(occ.vertices()[2], STRUCTURE_HALF_SIZE);
    }

    #[test]
    fn extraction_drops_degenerate_shapes() {
        let obstacles = vec![
            RotatingObstacle::regular(5, 30.0, Vec2::new(100.0, 0.0), 0.3),
            RotatingObstacle::new(vec![Vec2::ZERO, Vec2::new(1.0, 0.0)], Vec2::ZERO, 0.0),
            RotatingObstacle::regular(4, 10.0, Vec2::new(f64::NAN, 0.0), 0.0),
        ];
        let blockers = vec![Blocker::new(Vec2::new(0.0, 50.0), 1.0, BlockerArchetype::Hero)];
        let occluders = extract_occluders(&obstacles, &blockers);
        assert_eq!(occluders.len(), 2);
        assert!(matches!(occluders[0], Occluder::Polygon { .. }));
        assert!(occluders[1].is_oriented_block());
    }

    #[test]
    fn extract_into_replaces_previous_frame() {
        let mut out = extract_occluders(
            &[RotatingObstacle::regular(3, 5.0, Vec2::ZERO, 0.0)],
            &[],
        );
        extract_occluders_into(&[], &[], &mut out);
        assert!(out.is_empty());
    }
}

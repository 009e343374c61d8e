//! Point-in-shadow and line-of-sight queries.
//!
//! Queries cast rays straight against occluder outlines with
//! [`occlusion_distance`]. They never look at shadow quads, but both derive
//! from the same occluder list, so a point inside a drawn shadow is also
//! reported as shadowed.
//!
//! Split lights never take part in ray logic. Use [`Light::split_side`] for
//! them.

use serde::{Deserialize, Serialize};
use sol_ecs::entity::EntityId;

use crate::config::{LightConfig, DEFAULT_OCCLUSION_EPSILON};
use crate::geometry::{Vec2, EPSILON};
use crate::intersect::occlusion_distance;
use crate::light::Light;
use crate::occluder::Occluder;

/// How several ray-casting lights combine when deciding whether a point is
/// in shadow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowPolicy {
    /// In shadow only when every active light is blocked.
    #[default]
    AllLightsBlocked,
    /// In shadow when at least one active light is blocked.
    AnyLightBlocked,
}

/// Read-only view of one frame's lights and occluders.
#[derive(Debug, Clone, Copy)]
pub struct OcclusionQuery<'a> {
    lights: &'a [Light],
    occluders: &'a [Occluder],
    epsilon: f64,
    policy: ShadowPolicy,
    blocks_occlude: bool,
}

impl<'a> OcclusionQuery<'a> {
    /// Query with default policy and tolerance.
    pub fn new(lights: &'a [Light], occluders: &'a [Occluder]) -> Self {
        Self {
            lights,
            occluders,
            epsilon: DEFAULT_OCCLUSION_EPSILON,
            policy: ShadowPolicy::default(),
            blocks_occlude: true,
        }
    }

    /// Query using the policy and tolerances of `config`.
    pub fn with_config(lights: &'a [Light], occluders: &'a [Occluder], config: &LightConfig) -> Self {
        Self {
            lights,
            occluders,
            epsilon: config.occlusion_epsilon,
            policy: config.policy,
            blocks_occlude: config.blocks_occlude_gameplay,
        }
    }

    pub fn with_policy(mut self, policy: ShadowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether oriented blocks count as obstructions for these queries.
    pub fn with_blocks(mut self, blocks_occlude: bool) -> Self {
        self.blocks_occlude = blocks_occlude;
        self
    }

    pub fn lights(&self) -> &'a [Light] {
        self.lights
    }

    pub fn occluders(&self) -> &'a [Occluder] {
        self.occluders
    }

    pub fn policy(&self) -> ShadowPolicy {
        self.policy
    }

    /// Ray-casting lights, in order.
    pub fn active_lights(self) -> impl Iterator<Item = &'a Light> + 'a {
        self.lights.iter().filter(|l| l.casts_rays())
    }

    /// Whether any occluder cuts the straight segment `from -> to` before
    /// `to`, ignoring occluders owned by entities in `ignore`.
    pub fn segment_blocked(&self, from: Vec2, to: Vec2, ignore: &[EntityId]) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance < EPSILON || !distance.is_finite() {
            return false;
        }
        let direction = delta * (1.0 / distance);
        let limit = distance - self.epsilon;
        self.occluders
            .iter()
            .filter(|occ| self.participates(occ, ignore))
            .filter_map(|occ| occlusion_distance(from, direction, occ.vertices()))
            .any(|hit| hit < limit)
    }

    /// Whether `light` is blocked from reaching `point`. Split lights are
    /// never blocked.
    pub fn is_light_blocked(&self, light: &Light, point: Vec2) -> bool {
        light.casts_rays() && self.segment_blocked(light.position, point, &[])
    }

    /// Whether `point` is in shadow under the configured [`ShadowPolicy`].
    ///
    /// With no ray-casting lights nothing casts a shadow, so this is `false`.
    pub fn is_point_in_shadow(&self, point: Vec2) -> bool {
        self.is_point_in_shadow_ignoring(point, &[])
    }

    /// [`is_point_in_shadow`](Self::is_point_in_shadow) for a point inside an
    /// entity's own footprint: occluders owned by `ignore` do not count.
    pub fn is_point_in_shadow_ignoring(&self, point: Vec2, ignore: &[EntityId]) -> bool {
        let mut blocked = self
            .active_lights()
            .map(|light| self.segment_blocked(light.position, point, ignore))
            .peekable();
        if blocked.peek().is_none() {
            return false;
        }
        match self.policy {
            ShadowPolicy::AllLightsBlocked => blocked.all(|b| b),
            ShadowPolicy::AnyLightBlocked => blocked.any(|b| b),
        }
    }

    /// Ray-casting lights with a clear path to `point`.
    pub fn lit_by(self, point: Vec2) -> impl Iterator<Item = &'a Light> + 'a {
        self.active_lights()
            .filter(move |light| !self.segment_blocked(light.position, point, &[]))
    }

    /// Whether nothing blocks the straight path from `a` to `b`.
    pub fn has_line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        !self.segment_blocked(a, b, &[])
    }

    /// [`has_line_of_sight`](Self::has_line_of_sight) ignoring the footprints
    /// of the entities at either end.
    pub fn has_line_of_sight_ignoring(&self, a: Vec2, b: Vec2, ignore: &[EntityId]) -> bool {
        !self.segment_blocked(a, b, ignore)
    }

    fn participates(&self, occ: &Occluder, ignore: &[EntityId]) -> bool {
        match occ {
            Occluder::Polygon { .. } => true,
            Occluder::OrientedBlock { owner, .. } => {
                self.blocks_occlude && owner.map_or(true, |o| !ignore.contains(&o))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shadow quad construction.
//!
//! For one light and one occluder, every edge whose outward normal points away
//! from the light casts a [`ShadowQuad`]: the edge itself plus its two end
//! points pushed away from the light by a fixed shadow length.
//!
//! # Scratch buffers
//!
//! This runs `lights x occluders x edges` times per frame. The projection
//! helpers therefore write into caller-owned storage (`&mut Vec2`,
//! `&mut ShadowQuad`) instead of returning fresh values, and
//! [`ShadowQuadBuilder`] keeps one quad buffer alive across frames. None of
//! these functions retain the borrowed buffer after returning.
//!
//! The builder has no frame-to-frame state beyond that buffer's capacity:
//! building twice from unchanged inputs yields identical quads.
//!
//! # Several lights
//!
//! A frame's quads are kept grouped by the light that cast them
//! ([`ShadowSet`]). The union of one light's quads is exactly what that light
//! cannot see, so the region drawn as shadow follows the same
//! [`ShadowPolicy`] as the gameplay queries: the union of all groups under
//! [`AnyLightBlocked`](ShadowPolicy::AnyLightBlocked), their intersection
//! under [`AllLightsBlocked`](ShadowPolicy::AllLightsBlocked).

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{normalize_or_zero, signed_area, Vec2};
use crate::light::Light;
use crate::occluder::Occluder;
use crate::query::ShadowPolicy;

/// Default distance a shadow extends past its occluder edge.
pub const DEFAULT_SHADOW_LENGTH: f64 = 2000.0;

// ---------------------------------------------------------------------------
// ShadowQuad
// ---------------------------------------------------------------------------

/// The occluded region behind one occluder edge relative to one light.
///
/// Path order is `near[0], near[1], far[1], far[0]`, which never
/// self-intersects for a back-facing edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadowQuad {
    /// The occluder edge `(v1, v2)`.
    pub near: [Vec2; 2],
    /// `v1` and `v2` projected away from the light.
    pub far: [Vec2; 2],
}

impl ShadowQuad {
    /// Corners in fill order `(v1, v2, shadow2, shadow1)`.
    pub fn corners(&self) -> [Vec2; 4] {
        [self.near[0], self.near[1], self.far[1], self.far[0]]
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        signed_area(&self.corners()).abs()
    }

    /// Even-odd point containment. Points exactly on an edge may go either
    /// way.
    pub fn contains(&self, point: Vec2) -> bool {
        let corners = self.corners();
        let mut inside = false;
        let mut j = corners.len() - 1;
        for i in 0..corners.len() {
            let (a, b) = (corners[i], corners[j]);
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn is_finite(&self) -> bool {
        self.corners().iter().all(|c| c.is_finite())
    }
}

// ---------------------------------------------------------------------------
// ShadowSet
// ---------------------------------------------------------------------------

/// A frame's shadow quads, grouped per ray-casting light, plus the policy
/// that combines the groups.
///
/// Group `i` is `quads[ends[i - 1]..ends[i]]`. A light that casts no quads
/// still owns an (empty) group, so under
/// [`AllLightsBlocked`](ShadowPolicy::AllLightsBlocked) it keeps every point
/// lit. An empty `ends` means the whole slice is one group.
#[derive(Debug, Clone, Copy)]
pub struct ShadowSet<'a> {
    quads: &'a [ShadowQuad],
    ends: &'a [usize],
    policy: ShadowPolicy,
}

impl<'a> ShadowSet<'a> {
    /// Quads cast by a single light.
    pub fn single(quads: &'a [ShadowQuad]) -> Self {
        Self {
            quads,
            ends: &[],
            policy: ShadowPolicy::default(),
        }
    }

    /// Quads grouped by light, `ends` holding each group's end offset.
    pub fn grouped(quads: &'a [ShadowQuad], ends: &'a [usize]) -> Self {
        debug_assert!(ends.windows(2).all(|w| w[0] <= w[1]), "group ends must ascend");
        debug_assert!(ends.last().map_or(true, |&e| e == quads.len()));
        Self {
            quads,
            ends,
            policy: ShadowPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ShadowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ShadowPolicy {
        self.policy
    }

    /// Every quad, in build order.
    pub fn quads(&self) -> &'a [ShadowQuad] {
        self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Each light's quads.
    pub fn groups(self) -> impl Iterator<Item = &'a [ShadowQuad]> + 'a {
        let quads = self.quads;
        let whole = self.ends.is_empty().then_some(quads);
        let split = self.ends.iter().scan(0, move |start, &end| {
            let group = &quads[*start..end];
            *start = end;
            Some(group)
        });
        whole.into_iter().chain(split)
    }

    /// Whether `point` is drawn as shadow under this set's policy.
    pub fn covers(&self, point: Vec2) -> bool {
        let in_group = |group: &[ShadowQuad]| group.iter().any(|q| q.contains(point));
        match self.policy {
            ShadowPolicy::AnyLightBlocked => in_group(self.quads),
            ShadowPolicy::AllLightsBlocked => self.groups().all(in_group),
        }
    }
}

// ---------------------------------------------------------------------------
// Projection primitives
// ---------------------------------------------------------------------------

/// Sign to apply to an edge's right-hand perpendicular to get the outward
/// normal: `1.0` for counter-clockwise outlines, `-1.0` for clockwise.
pub fn outward_sign(vertices: &[Vec2]) -> f64 {
    if signed_area(vertices) >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Outward normal (not normalised) of edge `v1 -> v2`.
#[inline]
pub fn edge_normal(v1: Vec2, v2: Vec2, outward_sign: f64) -> Vec2 {
    let edge = v2 - v1;
    Vec2::new(edge.y, -edge.x) * outward_sign
}

/// Write `vertex` pushed `length` units directly away from `light` into `out`.
///
/// A vertex at the light has no direction; `out` then receives the vertex
/// itself, giving a zero-length projection.
#[inline]
pub fn project_vertex_into(light: Vec2, vertex: Vec2, length: f64, out: &mut Vec2) {
    let dir = normalize_or_zero(vertex - light);
    out.x = vertex.x + dir.x * length;
    out.y = vertex.y + dir.y * length;
}

/// Fill `out` with the shadow of edge `v1 -> v2` cast by a light at `light`.
///
/// Returns `false` and leaves `out` untouched when the edge faces the light
/// (`dot(to_light, normal) >= 0`).
pub fn project_edge_into(
    light: Vec2,
    v1: Vec2,
    v2: Vec2,
    outward_sign: f64,
    length: f64,
    out: &mut ShadowQuad,
) -> bool {
    let normal = edge_normal(v1, v2, outward_sign);
    let to_light = light - v1.lerp(v2, 0.5);
    if to_light.dot(normal) >= 0.0 {
        return false;
    }
    out.near = [v1, v2];
    project_vertex_into(light, v1, length, &mut out.far[0]);
    project_vertex_into(light, v2, length, &mut out.far[1]);
    true
}

// ---------------------------------------------------------------------------
// ShadowQuadBuilder
// ---------------------------------------------------------------------------

/// Builds shadow quads into a buffer that is reused from frame to frame.
#[derive(Debug, Clone)]
pub struct ShadowQuadBuilder {
    quads: Vec<ShadowQuad>,
    /// End offset of each light's group in `quads`.
    ends: Vec<usize>,
    shadow_length: f64,
}

impl ShadowQuadBuilder {
    pub fn new(shadow_length: f64) -> Self {
        Self {
            quads: Vec::new(),
            ends: Vec::new(),
            shadow_length,
        }
    }

    pub fn shadow_length(&self) -> f64 {
        self.shadow_length
    }

    /// Quads for a single light. Split lights produce none.
    pub fn build(&mut self, light: &Light, occluders: &[Occluder]) -> &[ShadowQuad] {
        self.quads.clear();
        self.ends.clear();
        self.append_light(light, occluders);
        trace!(quads = self.quads.len(), "built shadow quads for light");
        &self.quads
    }

    /// Quads for every light, one group per ray-casting light. The set uses
    /// the default policy; override it with [`ShadowSet::with_policy`].
    pub fn build_all(&mut self, lights: &[Light], occluders: &[Occluder]) -> ShadowSet<'_> {
        self.quads.clear();
        self.ends.clear();
        for light in lights {
            self.append_light(light, occluders);
        }
        trace!(
            lights = lights.len(),
            groups = self.ends.len(),
            quads = self.quads.len(),
            "built shadow quads"
        );
        ShadowSet::grouped(&self.quads, &self.ends)
    }

    /// The quads produced by the last build.
    pub fn quads(&self) -> &[ShadowQuad] {
        &self.quads
    }

    fn append_light(&mut self, light: &Light, occluders: &[Occluder]) {
        if !light.casts_rays() {
            return;
        }
        for occ in occluders {
            self.append_occluder(light.position, occ.vertices());
        }
        self.ends.push(self.quads.len());
    }

    fn append_occluder(&mut self, light: Vec2, vertices: &[Vec2]) {
        if vertices.len() < 3 {
            return;
        }
        let sign = outward_sign(vertices);
        let mut scratch = ShadowQuad::default();
        for (i, &v1) in vertices.iter().enumerate() {
            let v2 = vertices[(i + 1) % vertices.len()];
            if project_edge_into(light, v1, v2, sign, self.shadow_length, &mut scratch) {
                debug_assert!(
                    to_light_dot(light, &scratch, sign) < 0.0,
                    "shadow quad built for a light-facing edge"
                );
                self.quads.push(scratch);
            }
        }
    }
}

impl Default for ShadowQuadBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SHADOW_LENGTH)
    }
}

fn to_light_dot(light: Vec2, quad: &ShadowQuad, sign: f64) -> f64 {
    let [v1, v2] = quad.near;
    (light - v1.lerp(v2, 0.5)).dot(edge_normal(v1, v2, sign))
}

/// Allocating convenience wrapper around [`ShadowQuadBuilder::build`].
pub fn build_shadow_quads(light: &Light, occluders: &[Occluder], shadow_length: f64) -> Vec<ShadowQuad> {
    ShadowQuadBuilder::new(shadow_length)
        .build(light, occluders)
        .to_vec()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_at(cx: f64, cy: f64) -> Occluder {
        Occluder::oriented_block(Vec2::new(cx, cy), 0.0, Vec2::new(1.0, 1.0))
    }

    #[test]
    fn square_right_of_light_casts_from_far_side_edges() {
        let light = Light::new(Vec2::ZERO, 10.0);
        let quads = build_shadow_quads(&light, &[unit_square_at(10.0, 0.0)], 100.0);
        // Light sits between the planes of the top and bottom edges, so only
        // the near (left) edge faces it.
        assert_eq!(quads.len(), 3);
        for q in &quads {
            for k in 0..2 {
                assert!(light.position.distance(q.far[k]) > light.position.distance(q.near[k]));
            }
        }
        let right_edge = quads
            .iter()
            .find(|q| q.near[0].x == 11.0 && q.near[1].x == 11.0)
            .expect("far edge casts a shadow");
        assert!((right_edge.far[0].distance(right_edge.near[0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn facing_edges_cast_nothing() {
        let mut out = ShadowQuad::default();
        // Counter-clockwise square, left edge runs top -> bottom.
        let v1 = Vec2::new(9.0, 1.0);
        let v2 = Vec2::new(9.0, -1.0);
        assert!(!project_edge_into(Vec2::ZERO, v1, v2, 1.0, 50.0, &mut out));
        assert_eq!(out, ShadowQuad::default());
    }

    #[test]
    fn winding_does_not_change_result() {
        let light = Light::new(Vec2::new(-20.0, 3.0), 5.0);
        let ccw = unit_square_at(0.0, 0.0);
        let cw = Occluder::polygon(ccw.vertices().iter().rev().copied().collect());
        let a = build_shadow_quads(&light, &[ccw], 40.0);
        let b = build_shadow_quads(&light, &[cw], 40.0);
        assert_eq!(a.len(), b.len());
        let total = |qs: &[ShadowQuad]| qs.iter().map(ShadowQuad::area).sum::<f64>();
        assert!((total(&a) - total(&b)).abs() < 1e-9);
    }

    #[test]
    fn split_light_builds_no_quads() {
        let light = Light::split(Vec2::ZERO, 10.0);
        assert!(build_shadow_quads(&light, &[unit_square_at(5.0, 0.0)], 100.0).is_empty());
    }

    #[test]
    fn vertex_at_light_projects_to_itself() {
        let mut out = Vec2::new(99.0, 99.0);
        project_vertex_into(Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0), 500.0, &mut out);
        assert_eq!(out, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn builder_is_idempotent_and_reuses_buffer() {
        let light = Light::new(Vec2::ZERO, 1.0);
        let occluders = vec![unit_square_at(5.0, 2.0), unit_square_at(-4.0, -7.0)];
        let mut builder = ShadowQuadBuilder::new(300.0);
        let first = builder.build(&light, &occluders).to_vec();
        let capacity = builder.quads.capacity();
        let second = builder.build(&light, &occluders).to_vec();
        assert_eq!(first, second);
        assert_eq!(builder.quads.capacity(), capacity);
    }

    #[test]
    fn every_ray_casting_light_gets_a_group() {
        let lights = [
            Light::new(Vec2::new(-50.0, 0.0), 1.0),
            Light::split(Vec2::ZERO, 1.0),
            Light::new(Vec2::new(0.0, 500.0), 1.0),
        ];
        let occluders = [unit_square_at(-40.0, 0.0)];
        let mut builder = ShadowQuadBuilder::new(20.0);
        let set = builder.build_all(&lights, &occluders);
        let sizes: Vec<usize> = set.groups().map(<[ShadowQuad]>::len).collect();
        assert_eq!(sizes.len(), 2);
        assert!(sizes[0] > 0);
        assert_eq!(sizes.iter().sum::<usize>(), set.len());
    }

    #[test]
    fn set_coverage_follows_policy() {
        // The midpoint between two lights is shadowed by a light only when a
        // square sits between it and that light.
        let left = Light::new(Vec2::new(-100.0, 0.0), 1.0);
        let right = Light::new(Vec2::new(100.0, 0.0), 1.0);
        let occluders = [unit_square_at(-50.0, 0.0)];
        let mut builder = ShadowQuadBuilder::new(500.0);
        let set = builder.build_all(&[left, right], &occluders);

        let between = Vec2::new(0.0, 0.0);
        assert!(set.with_policy(ShadowPolicy::AnyLightBlocked).covers(between));
        assert!(!set.with_policy(ShadowPolicy::AllLightsBlocked).covers(between));

        let both = [unit_square_at(-50.0, 0.0), unit_square_at(50.0, 0.0)];
        let set = builder.build_all(&[left, right], &both);
        assert!(set.with_policy(ShadowPolicy::AllLightsBlocked).covers(between));
    }

    #[test]
    fn single_group_covers_its_quads() {
        let light = Light::new(Vec2::ZERO, 1.0);
        let quads = build_shadow_quads(&light, &[unit_square_at(10.0, 0.0)], 100.0);
        let set = ShadowSet::single(&quads);
        assert_eq!(set.groups().count(), 1);
        assert!(set.covers(Vec2::new(20.0, 0.0)));
        assert!(!ShadowSet::single(&[]).covers(Vec2::new(20.0, 0.0)));
    }

    #[test]
    fn quad_contains_points_behind_edge() {
        let light = Light::new(Vec2::ZERO, 1.0);
        let quads = build_shadow_quads(&light, &[unit_square_at(10.0, 0.0)], 100.0);
        assert!(quads.iter().any(|q| q.contains(Vec2::new(20.0, 0.0))));
        assert!(!quads.iter().any(|q| q.contains(Vec2::new(-20.0, 0.0))));
        assert!(!quads.iter().any(|q| q.contains(Vec2::new(20.0, 30.0))));
    }
}

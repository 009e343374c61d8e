//! Ray versus segment and ray versus polygon intersection.
//!
//! These are the only primitives the query layer uses. Degenerate input never
//! errors: parallel pairs, zero-length directions and polygons with fewer than
//! three vertices all report "no hit".

use crate::geometry::{Vec2, EPSILON};

/// Distance along the ray `origin + t * direction` at which it crosses the
/// segment `p1..p2`, or `None`.
///
/// `t` is expressed in multiples of `direction`, so a unit direction yields a
/// world-space distance. Only hits with `t >= 0` and segment parameter in
/// `[0, 1]` count. Parallel and collinear pairs report `None`.
pub fn intersect_segment(origin: Vec2, direction: Vec2, p1: Vec2, p2: Vec2) -> Option<f64> {
    let edge = p2 - p1;
    let det = direction.perp_dot(edge);
    if det.abs() < EPSILON {
        return None;
    }
    let offset = p1 - origin;
    let t = offset.perp_dot(edge) / det;
    let s = offset.perp_dot(direction) / det;
    if t >= 0.0 && (0.0..=1.0).contains(&s) && t.is_finite() {
        Some(t)
    } else {
        None
    }
}

/// Nearest distance at which the ray enters any edge of the closed polygon
/// `vertices` (the last vertex connects back to the first).
///
/// Returns `None` for a miss or for a degenerate polygon with fewer than
/// three vertices.
pub fn occlusion_distance(origin: Vec2, direction: Vec2, vertices: &[Vec2]) -> Option<f64> {
    if vertices.len() < 3 {
        return None;
    }
    let mut nearest: Option<f64> = None;
    for (i, &v1) in vertices.iter().enumerate() {
        let v2 = vertices[(i + 1) % vertices.len()];
        if let Some(t) = intersect_segment(origin, direction, v1, v2) {
            if t > 0.0 && nearest.map_or(true, |n| t < n) {
                nearest = Some(t);
            }
        }
    }
    nearest
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

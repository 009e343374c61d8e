//! 2D vector math shared by every stage of the light engine.
//!
//! Points and directions are [`glam::DVec2`]. Only two helpers live here: a
//! normalisation that treats near-zero vectors as zero instead of dividing by
//! them, and the shoelace area used to recover polygon winding.

/// A 2D point or direction in world units.
pub type Vec2 = glam::DVec2;

/// Tolerance for "effectively zero" lengths and determinants.
pub const EPSILON: f64 = 1e-9;

/// Unit vector along `v`, or [`Vec2::ZERO`] when `v` is shorter than
/// [`EPSILON`].
///
/// Never produces `NaN` for finite input. `glam`'s own `normalize_or_zero`
/// only falls back for exactly-zero lengths.
#[inline]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len = v.length();
    if len < EPSILON || !len.is_finite() {
        Vec2::ZERO
    } else {
        v / len
    }
}

/// Signed area of a closed polygon (shoelace). Positive for counter-clockwise
/// winding in a y-up frame.
pub fn signed_area(vertices: &[Vec2]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, v) in vertices.iter().enumerate() {
        let next = vertices[(i + 1) % vertices.len()];
        twice += v.perp_dot(next);
    }
    twice * 0.5
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_vectors_normalize_to_zero() {
        assert_eq!(normalize_or_zero(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(normalize_or_zero(Vec2::new(1e-12, 0.0)), Vec2::ZERO);
        assert!(normalize_or_zero(Vec2::new(1e-12, -1e-13)).is_finite());
    }

    #[test]
    fn normalize_produces_unit_length() {
        let n = normalize_or_zero(Vec2::new(3.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!(n.abs_diff_eq(Vec2::new(0.6, 0.8), 1e-12));
    }

    #[test]
    fn signed_area_tracks_winding() {
        let ccw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert_eq!(signed_area(&ccw), 4.0);
        let cw: Vec<Vec2> = ccw.iter().rev().copied().collect();
        assert_eq!(signed_area(&cw), -4.0);
        assert_eq!(signed_area(&ccw[..2]), 0.0);
    }
}

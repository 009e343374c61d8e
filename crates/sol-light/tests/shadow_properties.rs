//! Property tests for shadow quad construction.
//!
//! Random convex obstacles and lights outside them are generated; every quad
//! must start on a real occluder edge and reach strictly farther from the
//! light than that edge. Degenerate layouts must never produce NaN.

use proptest::prelude::*;
use sol_light::prelude::*;

/// Finite coordinates in a game-sized world.
fn coord() -> impl Strategy<Value = f64> {
    (-50_000i32..50_000i32).prop_map(|v| v as f64 * 0.1)
}

/// A convex regular polygon plus a light at least twice its radius away.
fn convex_scene() -> impl Strategy<Value = (Occluder, Light)> {
    (
        3usize..10,
        5.0f64..200.0,
        coord(),
        coord(),
        0.0f64..std::f64::consts::TAU,
        0.0f64..std::f64::consts::TAU,
        2.0f64..20.0,
    )
        .prop_map(|(sides, radius, cx, cy, rotation, bearing, reach)| {
            let center = Vec2::new(cx, cy);
            let rock = RotatingObstacle::regular(sides, radius, center, rotation);
            let light = Light::new(center + Vec2::from_angle(bearing) * (radius * reach), 30.0);
            (Occluder::polygon(rock.world_vertices()), light)
        })
}

fn is_edge(occ: &Occluder, a: Vec2, b: Vec2) -> bool {
    let v = occ.vertices();
    (0..v.len()).any(|i| v[i] == a && v[(i + 1) % v.len()] == b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn quads_start_on_edges_and_extend_away((occ, light) in convex_scene(), length in 10.0f64..5_000.0) {
        let quads = build_shadow_quads(&light, std::slice::from_ref(&occ), length);
        prop_assert!(!quads.is_empty(), "a light outside a convex polygon always sees a silhouette");
        for q in &quads {
            prop_assert!(is_edge(&occ, q.near[0], q.near[1]));
            for k in 0..2 {
                let near = light.position.distance(q.near[k]);
                let far = light.position.distance(q.far[k]);
                prop_assert!(far > near, "far {far} not beyond near {near}");
                prop_assert!((far - near - length).abs() < 1e-6 * length.max(1.0));
            }
        }
    }

    #[test]
    fn building_twice_gives_identical_quads((occ, light) in convex_scene()) {
        let occluders = vec![occ];
        let mut builder = ShadowQuadBuilder::new(1_000.0);
        let first = builder.build(&light, &occluders).to_vec();
        let second = builder.build(&light, &occluders).to_vec();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn two_vertex_occluders_cast_nothing(a in (coord(), coord()), b in (coord(), coord()), l in (coord(), coord())) {
        let occ = Occluder::polygon(vec![Vec2::new(a.0, a.1), Vec2::new(b.0, b.1)]);
        let light = Light::new(Vec2::new(l.0, l.1), 10.0);
        prop_assert!(build_shadow_quads(&light, &[occ], 500.0).is_empty());
    }

    #[test]
    fn light_on_a_vertex_stays_finite((occ, _) in convex_scene(), pick in 0usize..10) {
        let v = occ.vertices();
        let light = Light::new(v[pick % v.len()], 10.0);
        for q in build_shadow_quads(&light, std::slice::from_ref(&occ), 800.0) {
            prop_assert!(q.is_finite());
        }
    }
}

#[test]
fn degenerate_triangle_of_repeated_points_is_finite() {
    let p = Vec2::new(3.0, 3.0);
    let occ = Occluder::polygon(vec![p, p, p]);
    let light = Light::new(p, 1.0);
    for q in build_shadow_quads(&light, &[occ], 100.0) {
        assert!(q.is_finite());
        assert_eq!(q.area(), 0.0);
    }
}

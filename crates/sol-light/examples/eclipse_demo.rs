//! Headless eclipse demo: a sun, a reflector and a forge inside a drifting
//! asteroid field, with scouts crossing the shadows.
//!
//! Run with:
//!   cargo run --example eclipse_demo -p sol-light [config.json]
//!
//! Set `RUST_LOG=sol_light=trace` to see per-frame geometry.

use anyhow::Context;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing::info;

use sol_light::prelude::*;

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

const FRAMES: usize = 240;
const FRAME_TIME: f64 = 1.0 / 60.0;

struct Scout {
    id: EntityId,
    position: Vec2,
    velocity: Vec2,
}

fn asteroid_field(rng: &mut Pcg64Mcg, count: usize) -> Vec<(RotatingObstacle, f64)> {
    (0..count)
        .map(|_| {
            let distance = rng.gen_range(120.0..420.0);
            let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
            let rock = RotatingObstacle::regular(
                rng.gen_range(5..9),
                rng.gen_range(12.0..35.0),
                Vec2::from_angle(bearing) * distance,
                rng.gen_range(0.0..std::f64::consts::TAU),
            );
            (rock, rng.gen_range(-1.0..1.0))
        })
        .collect()
}

fn load_config() -> anyhow::Result<LightConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading light config {path}"))?;
            Ok(LightConfig::from_json_str(&json)?)
        }
        None => Ok(LightConfig::default()),
    }
}

/// Coarse text rendering of the composited light layer.
fn ascii_mask(mask: &CoverageMask) -> String {
    let mut out = String::with_capacity((mask.width() + 1) * mask.height());
    for cy in (0..mask.height()).rev() {
        for cx in 0..mask.width() {
            out.push(if mask.light_at(cx, cy) == 0.0 { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let tier = config.quality;
    let mut engine = LightingEngine::new(config)?;
    let mut rng = Pcg64Mcg::seed_from_u64(0x501);
    let mut next_index = 0;
    let mut spawn = || {
        next_index += 1;
        EntityId::new(next_index - 1, 0)
    };

    let lights = [
        Light::new(Vec2::ZERO, 60.0),
        Light::split(Vec2::new(0.0, 500.0), 40.0),
    ];
    let mut field = asteroid_field(&mut rng, 24);
    let mirror = Reflector {
        entity: Some(spawn()),
        position: Vec2::new(-300.0, 300.0),
    };
    let forge_id = spawn();
    let forge = Structure {
        entity: Some(forge_id),
        position: Vec2::new(300.0, 300.0),
    };
    let mut scouts: Vec<Scout> = (0..6)
        .map(|i| Scout {
            id: spawn(),
            position: Vec2::new(-450.0, -250.0 + 100.0 * i as f64),
            velocity: Vec2::new(rng.gen_range(60.0..140.0), rng.gen_range(-20.0..20.0)),
        })
        .collect();

    let mask = CoverageMask::new(Vec2::new(-480.0, -480.0), 16.0, 60, 60);
    let mut compositor = Compositor::new(Some(mask), tier)?;

    let mut now = 0.0;
    for frame in 0..FRAMES {
        now += FRAME_TIME;
        for (rock, spin) in &mut field {
            rock.rotation += *spin * FRAME_TIME;
        }
        for scout in &mut scouts {
            scout.position = scout.position + scout.velocity * FRAME_TIME;
        }

        let rocks: Vec<RotatingObstacle> = field.iter().map(|(r, _)| r.clone()).collect();
        let mut blockers: Vec<Blocker> = scouts
            .iter()
            .map(|s| {
                Blocker::new(s.position, s.velocity.y.atan2(s.velocity.x), BlockerArchetype::Hero)
                    .owned_by(s.id)
            })
            .collect();
        blockers.push(Blocker::new(forge.position, 0.0, BlockerArchetype::Structure).owned_by(forge_id));

        let summary = engine.begin_frame(now, &lights, &rocks, &blockers);

        let mut renderable = 0;
        for scout in &scouts {
            let hidden = engine
                .query()
                .is_point_in_shadow_ignoring(scout.position, &[scout.id]);
            engine.visibility_alpha(scout.id, !hidden, now);
            engine.shadow_glow_alpha(scout.id, hidden, now);
            renderable += usize::from(engine.is_renderable(scout.id));
        }

        let powered = structure_receives_light(&engine.query(), &[mirror], &forge);

        compositor.canvas_mut().reset_layers();
        let report = compositor.composite(engine.build_frame_shadows());

        if frame % 60 == 0 {
            info!(
                frame = summary.frame,
                quads = report.quads,
                shaded_cells = compositor.canvas().shaded_cells(),
                renderable,
                powered,
                "eclipse frame"
            );
        }
    }

    println!("{}", ascii_mask(compositor.canvas()));
    Ok(())
}

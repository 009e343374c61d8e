//! Per-frame driver tying the pieces together.
//!
//! Each frame:
//!
//! 1. [`LightingEngine::begin_frame`] takes the frame's lights and occluder
//!    sources, rebuilds the occluder list from current transforms, and
//!    advances the shared fade clock exactly once.
//! 2. Gameplay asks [`is_point_in_shadow`](LightingEngine::is_point_in_shadow)
//!    and [`has_line_of_sight`](LightingEngine::has_line_of_sight).
//! 3. Rendering asks for shadow quads and per-entity fade alphas.
//!
//! Nothing but fade state survives from one frame to the next.
//!
//! ```
//! use sol_light::prelude::*;
//!
//! let mut engine = LightingEngine::new(LightConfig::default()).unwrap();
//! let suns = [Light::new(Vec2::new(0.0, 0.0), 60.0)];
//! let rocks = [RotatingObstacle::regular(6, 20.0, Vec2::new(100.0, 0.0), 0.0)];
//! engine.begin_frame(0.0, &suns, &rocks, &[]);
//!
//! assert!(engine.is_point_in_shadow(Vec2::new(200.0, 0.0)));
//! assert!(!engine.is_point_in_shadow(Vec2::new(-200.0, 0.0)));
//! assert!(!engine.build_frame_shadows().is_empty());
//! ```

use sol_ecs::entity::EntityId;
use tracing::trace;

use crate::config::LightConfig;
use crate::fade::FadeController;
use crate::geometry::Vec2;
use crate::light::Light;
use crate::occluder::{extract_occluders_into, Blocker, Occluder, RotatingObstacle};
use crate::query::OcclusionQuery;
use crate::shadow::{ShadowQuad, ShadowQuadBuilder, ShadowSet};
use crate::LightError;

/// Counts describing the frame just begun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub frame: u64,
    /// Elapsed seconds since the previous frame.
    pub dt: f64,
    pub lights: usize,
    pub occluders: usize,
}

/// Owns the engine's frame-scoped buffers and its cross-frame fade state.
#[derive(Debug, Clone)]
pub struct LightingEngine {
    config: LightConfig,
    lights: Vec<Light>,
    occluders: Vec<Occluder>,
    builder: ShadowQuadBuilder,
    fade: FadeController,
}

impl LightingEngine {
    /// # Errors
    ///
    /// [`LightError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: LightConfig) -> Result<Self, LightError> {
        config.validate()?;
        Ok(Self {
            builder: ShadowQuadBuilder::new(config.shadow_length),
            fade: FadeController::from_config(&config),
            lights: Vec::new(),
            occluders: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    /// Start a frame stamped `now` (seconds).
    ///
    /// Must be called once per frame before any query or fade lookup.
    pub fn begin_frame(
        &mut self,
        now: f64,
        lights: &[Light],
        obstacles: &[RotatingObstacle],
        blockers: &[Blocker],
    ) -> FrameSummary {
        self.lights.clear();
        self.lights.extend_from_slice(lights);
        extract_occluders_into(obstacles, blockers, &mut self.occluders);
        let dt = self.fade.begin_frame(now);
        let summary = FrameSummary {
            frame: self.fade.clock().frame(),
            dt,
            lights: self.lights.len(),
            occluders: self.occluders.len(),
        };
        trace!(?summary, "frame started");
        summary
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn occluders(&self) -> &[Occluder] {
        &self.occluders
    }

    /// Query view over the current frame.
    pub fn query(&self) -> OcclusionQuery<'_> {
        OcclusionQuery::with_config(&self.lights, &self.occluders, &self.config)
    }

    pub fn is_point_in_shadow(&self, point: Vec2) -> bool {
        self.query().is_point_in_shadow(point)
    }

    pub fn has_line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        self.query().has_line_of_sight(a, b)
    }

    /// Shadow quads for one light against this frame's occluders.
    pub fn build_shadow_quads(&mut self, light: &Light) -> &[ShadowQuad] {
        self.builder.build(light, &self.occluders)
    }

    /// Shadow quads for every light of this frame, grouped per light and
    /// combined under the configured policy.
    pub fn build_frame_shadows(&mut self) -> ShadowSet<'_> {
        self.builder
            .build_all(&self.lights, &self.occluders)
            .with_policy(self.config.policy)
    }

    /// Reveal alpha for `entity`. `now` must be the timestamp passed to this
    /// frame's [`begin_frame`](Self::begin_frame).
    pub fn visibility_alpha(&mut self, entity: EntityId, is_visible: bool, now: f64) -> f64 {
        self.debug_assert_frame(now);
        self.fade.reveal_alpha(entity, is_visible, now)
    }

    /// Shadow-glow alpha for `entity`. Same timestamp rule as
    /// [`visibility_alpha`](Self::visibility_alpha).
    pub fn shadow_glow_alpha(&mut self, entity: EntityId, spotted_in_shade: bool, now: f64) -> f64 {
        self.debug_assert_frame(now);
        self.fade.shadow_glow_alpha(entity, spotted_in_shade, now)
    }

    /// Whether rendering should draw `entity` at all this frame.
    pub fn is_renderable(&self, entity: EntityId) -> bool {
        self.fade.is_renderable(entity)
    }

    pub fn fade(&self) -> &FadeController {
        &self.fade
    }

    pub fn fade_mut(&mut self) -> &mut FadeController {
        &mut self.fade
    }

    fn debug_assert_frame(&self, now: f64) {
        debug_assert!(
            self.fade.clock().is_current(now),
            "fade query at {now} before begin_frame advanced the clock to it"
        );
    }
}

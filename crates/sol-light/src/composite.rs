//! Shadow compositing.
//!
//! The renderer turns a frame's [`ShadowSet`] into one clip region and runs a
//! short list of passes through it:
//!
//! 1. cut matching holes in the additive ambient-light layer;
//! 2. redraw the cached background through the clip so shaded areas keep
//!    their detail instead of going flat black;
//! 3. at [`QualityTier::Ultra`] only, boost contrast inside the clip.
//!
//! The clip is boolean. Within one light's group a pixel covered by two
//! overlapping quads is treated exactly like one covered by a single quad, so
//! concave occluder clusters never double-darken. Across lights the groups
//! combine under the set's [`ShadowPolicy`](crate::query::ShadowPolicy), so
//! the drawn shadow is the region the gameplay queries call shadowed.
//!
//! Drawing surfaces plug in through [`ShadowCanvas`]. [`CoverageMask`] is a
//! small software implementation used for headless runs and tests.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::geometry::Vec2;
use crate::shadow::ShadowSet;
use crate::LightError;

/// Contrast boost applied inside shadows at [`QualityTier::Ultra`].
pub const ULTRA_CONTRAST_STRENGTH: f32 = 0.35;

/// Visual quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

/// One step of the compositing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositePass {
    CutAmbientLight,
    RedrawBackground,
    BoostContrast,
}

const BASE_PASSES: &[CompositePass] = &[
    CompositePass::CutAmbientLight,
    CompositePass::RedrawBackground,
];

const ULTRA_PASSES: &[CompositePass] = &[
    CompositePass::CutAmbientLight,
    CompositePass::RedrawBackground,
    CompositePass::BoostContrast,
];

impl QualityTier {
    /// Passes run at this tier, in order.
    pub fn passes(self) -> &'static [CompositePass] {
        match self {
            QualityTier::Ultra => ULTRA_PASSES,
            _ => BASE_PASSES,
        }
    }
}

// ---------------------------------------------------------------------------
// ShadowCanvas
// ---------------------------------------------------------------------------

/// A drawing surface the compositor can clip and paint.
///
/// Implementations must treat the clip as a set: covering a pixel twice is
/// the same as covering it once.
pub trait ShadowCanvas {
    /// Replace the clip with the region `shadows` covers.
    fn clip_to_shadows(&mut self, shadows: &ShadowSet<'_>);

    /// Remove the clip.
    fn reset_clip(&mut self);

    /// Erase the ambient-light layer inside the clip.
    fn cut_light_layer(&mut self);

    /// Draw the cached background layer inside the clip.
    fn draw_background(&mut self);

    /// Apply a contrast filter of `strength` inside the clip.
    fn boost_contrast(&mut self, strength: f32);
}

/// What one [`Compositor::composite`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeReport {
    pub quads: usize,
    pub passes: usize,
}

/// Runs the compositing passes against a [`ShadowCanvas`].
#[derive(Debug)]
pub struct Compositor<C> {
    canvas: C,
    tier: QualityTier,
}

impl<C: ShadowCanvas> Compositor<C> {
    /// Wrap an acquired drawing surface.
    ///
    /// # Errors
    ///
    /// [`LightError::SurfaceUnavailable`] when no surface could be acquired.
    /// Without one the engine can produce no visual output at all.
    pub fn new(canvas: Option<C>, tier: QualityTier) -> Result<Self, LightError> {
        let Some(canvas) = canvas else {
            error!("no drawing surface available for shadow compositing");
            return Err(LightError::SurfaceUnavailable);
        };
        debug!(?tier, passes = tier.passes().len(), "shadow compositor ready");
        Ok(Self { canvas, tier })
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn set_tier(&mut self, tier: QualityTier) {
        if tier != self.tier {
            debug!(from = ?self.tier, to = ?tier, "compositing tier changed");
            self.tier = tier;
        }
    }

    /// Composite one frame's shadows.
    pub fn composite(&mut self, shadows: ShadowSet<'_>) -> CompositeReport {
        if shadows.is_empty() {
            return CompositeReport::default();
        }
        self.canvas.clip_to_shadows(&shadows);
        let passes = self.tier.passes();
        for pass in passes {
            match pass {
                CompositePass::CutAmbientLight => self.canvas.cut_light_layer(),
                CompositePass::RedrawBackground => self.canvas.draw_background(),
                CompositePass::BoostContrast => self.canvas.boost_contrast(ULTRA_CONTRAST_STRENGTH),
            }
        }
        self.canvas.reset_clip();
        trace!(
            quads = shadows.len(),
            policy = ?shadows.policy(),
            passes = passes.len(),
            "composited shadows"
        );
        CompositeReport {
            quads: shadows.len(),
            passes: passes.len(),
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }
}

// ---------------------------------------------------------------------------
// CoverageMask
// ---------------------------------------------------------------------------

/// Software [`ShadowCanvas`] sampling one point per grid cell.
///
/// Layers:
/// - `light`: ambient light intensity, `1.0` until cut to `0.0`;
/// - `background`: whether the background was redrawn in the cell;
/// - `contrast`: contrast strength applied in the cell.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    origin: Vec2,
    cell_size: f64,
    width: usize,
    height: usize,
    clip: Vec<bool>,
    light: Vec<f32>,
    background: Vec<bool>,
    contrast: Vec<f32>,
}

impl CoverageMask {
    /// A `width x height` grid of `cell_size` cells whose lower-left corner is
    /// `origin`.
    pub fn new(origin: Vec2, cell_size: f64, width: usize, height: usize) -> Self {
        let n = width * height;
        Self {
            origin,
            cell_size,
            width,
            height,
            clip: vec![false; n],
            light: vec![1.0; n],
            background: vec![false; n],
            contrast: vec![0.0; n],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// World position sampled by cell `(cx, cy)`.
    pub fn cell_center(&self, cx: usize, cy: usize) -> Vec2 {
        self.origin
            + Vec2::new(
                (cx as f64 + 0.5) * self.cell_size,
                (cy as f64 + 0.5) * self.cell_size,
            )
    }

    /// Cell containing `point`, if inside the grid.
    pub fn cell_of(&self, point: Vec2) -> Option<(usize, usize)> {
        let local = point - self.origin;
        let cx = (local.x / self.cell_size).floor();
        let cy = (local.y / self.cell_size).floor();
        if cx < 0.0 || cy < 0.0 || cx >= self.width as f64 || cy >= self.height as f64 {
            return None;
        }
        Some((cx as usize, cy as usize))
    }

    pub fn light_at(&self, cx: usize, cy: usize) -> f32 {
        self.light[cy * self.width + cx]
    }

    pub fn background_at(&self, cx: usize, cy: usize) -> bool {
        self.background[cy * self.width + cx]
    }

    pub fn contrast_at(&self, cx: usize, cy: usize) -> f32 {
        self.contrast[cy * self.width + cx]
    }

    /// Number of cells whose ambient light has been cut.
    pub fn shaded_cells(&self) -> usize {
        self.light.iter().filter(|&&l| l == 0.0).count()
    }

    /// Restore every layer to its start-of-frame state.
    pub fn reset_layers(&mut self) {
        self.clip.fill(false);
        self.light.fill(1.0);
        self.background.fill(false);
        self.contrast.fill(0.0);
    }
}

impl ShadowCanvas for CoverageMask {
    fn clip_to_shadows(&mut self, shadows: &ShadowSet<'_>) {
        for cy in 0..self.height {
            for cx in 0..self.width {
                let p = self.cell_center(cx, cy);
                self.clip[cy * self.width + cx] = shadows.covers(p);
            }
        }
    }

    fn reset_clip(&mut self) {
        self.clip.fill(false);
    }

    fn cut_light_layer(&mut self) {
        for (light, _) in self.light.iter_mut().zip(&self.clip).filter(|(_, c)| **c) {
            *light = 0.0;
        }
    }

    fn draw_background(&mut self) {
        for (shown, _) in self.background.iter_mut().zip(&self.clip).filter(|(_, c)| **c) {
            *shown = true;
        }
    }

    fn boost_contrast(&mut self, strength: f32) {
        for (contrast, _) in self.contrast.iter_mut().zip(&self.clip).filter(|(_, c)| **c) {
            *contrast = strength;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Engine configuration.
//!
//! [`LightConfig`] is a plain struct with sensible defaults. It can be built
//! in code or read from JSON; missing fields keep their defaults.
//!
//! ```
//! use sol_light::config::LightConfig;
//! use sol_light::query::ShadowPolicy;
//!
//! let cfg = LightConfig::from_json_str(r#"{ "policy": "AnyLightBlocked" }"#).unwrap();
//! assert_eq!(cfg.policy, ShadowPolicy::AnyLightBlocked);
//! assert_eq!(cfg.shadow_length, LightConfig::default().shadow_length);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::composite::QualityTier;
use crate::fade::FadeRates;
use crate::query::ShadowPolicy;
use crate::shadow::DEFAULT_SHADOW_LENGTH;
use crate::LightError;

/// Default slack subtracted from the light-to-point distance before an
/// occluder hit counts as blocking.
pub const DEFAULT_OCCLUSION_EPSILON: f64 = 1e-3;

/// Default reveal alpha at or below which an entity is not drawn.
pub const DEFAULT_VISIBLE_THRESHOLD: f64 = 0.01;

/// Configuration for the light engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// How far shadow quads extend past their occluder edge, in world units.
    pub shadow_length: f64,
    /// Hits closer than `distance - occlusion_epsilon` block; anything at the
    /// target itself does not.
    pub occlusion_epsilon: f64,
    /// How multiple lights combine in point-in-shadow queries.
    pub policy: ShadowPolicy,
    /// Whether oriented-block occluders (units) block gameplay queries as
    /// well as drawing.
    pub blocks_occlude_gameplay: bool,
    /// Fade speeds, in alpha per second.
    pub fade: FadeRates,
    /// Reveal alpha at or below which an entity is skipped by rendering.
    pub visible_threshold: f64,
    /// Compositing quality.
    pub quality: QualityTier,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            shadow_length: DEFAULT_SHADOW_LENGTH,
            occlusion_epsilon: DEFAULT_OCCLUSION_EPSILON,
            policy: ShadowPolicy::default(),
            blocks_occlude_gameplay: true,
            fade: FadeRates::default(),
            visible_threshold: DEFAULT_VISIBLE_THRESHOLD,
            quality: QualityTier::High,
        }
    }
}

impl LightConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`LightError::ConfigParse`] for malformed JSON and
    /// [`LightError::InvalidConfig`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, LightError> {
        let cfg: LightConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        debug!(?cfg, "loaded light config");
        Ok(cfg)
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// [`LightError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), LightError> {
        positive("shadow_length", self.shadow_length)?;
        if !(self.occlusion_epsilon >= 0.0 && self.occlusion_epsilon.is_finite()) {
            return Err(invalid("occlusion_epsilon", "must be finite and non-negative"));
        }
        positive("fade.reveal", self.fade.reveal)?;
        positive("fade.glow_in", self.fade.glow_in)?;
        positive("fade.glow_out", self.fade.glow_out)?;
        if !(0.0..1.0).contains(&self.visible_threshold) {
            return Err(invalid("visible_threshold", "must be in [0, 1)"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), LightError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be positive and finite"))
    }
}

fn invalid(field: &'static str, reason: &'static str) -> LightError {
    LightError::InvalidConfig { field, reason }
}

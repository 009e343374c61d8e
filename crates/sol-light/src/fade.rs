//! Visibility fade controller.
//!
//! Turns per-frame booleans ("is this entity visible", "was it spotted while
//! in shade") into smoothly changing alphas. Each tracked entity has two
//! independent channels in `[0, 1]`:
//!
//! - **reveal**, fading in and out at the same rate;
//! - **shadow glow**, fading in quickly and out slowly.
//!
//! A channel moves toward its target by at most `rate * dt` per frame and
//! snaps exactly onto the target once within reach. State lives in a
//! [`ComponentColumn`] keyed by [`EntityId`], so a despawned entity's state is
//! replaced the first time its recycled index is queried.

use serde::{Deserialize, Serialize};
use sol_ecs::column::ComponentColumn;
use sol_ecs::entity::EntityId;
use tracing::warn;

use crate::clock::FrameClock;
use crate::config::{LightConfig, DEFAULT_VISIBLE_THRESHOLD};

/// Move by `delta`, but never by more than `max_step` in either direction.
///
/// Returns `delta` itself when `|delta| <= max_step`, so a value stepping
/// toward a target lands on it exactly.
#[inline]
pub fn clamp_step(delta: f64, max_step: f64) -> f64 {
    let max_step = max_step.max(0.0);
    if delta.abs() <= max_step {
        delta
    } else {
        max_step.copysign(delta)
    }
}

/// Fade speeds in alpha units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeRates {
    /// Reveal channel, both directions.
    pub reveal: f64,
    /// Shadow-glow channel while rising.
    pub glow_in: f64,
    /// Shadow-glow channel while falling.
    pub glow_out: f64,
}

impl Default for FadeRates {
    fn default() -> Self {
        Self {
            reveal: 4.0,
            glow_in: 10.0,
            glow_out: 1.5,
        }
    }
}

/// Which of an entity's two alphas to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeChannel {
    Reveal,
    ShadowGlow,
}

/// Both fade channels of one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FadeState {
    reveal: f64,
    glow: f64,
    reveal_frame: Option<u64>,
    glow_frame: Option<u64>,
}

impl FadeState {
    /// State with the given starting alphas, clamped to `[0, 1]`.
    pub fn new(reveal: f64, glow: f64) -> Self {
        Self {
            reveal: reveal.clamp(0.0, 1.0),
            glow: glow.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn reveal(&self) -> f64 {
        self.reveal
    }

    pub fn glow(&self) -> f64 {
        self.glow
    }

    /// Step `channel` toward `on` (1.0) or off (0.0) for frame `frame`.
    ///
    /// A channel steps at most once per frame; later calls in the same frame
    /// return the already-stepped value.
    pub fn step(
        &mut self,
        channel: FadeChannel,
        on: bool,
        dt: f64,
        frame: u64,
        rates: &FadeRates,
    ) -> f64 {
        let (value, last) = match channel {
            FadeChannel::Reveal => (&mut self.reveal, &mut self.reveal_frame),
            FadeChannel::ShadowGlow => (&mut self.glow, &mut self.glow_frame),
        };
        if *last == Some(frame) {
            return *value;
        }
        let target = if on { 1.0 } else { 0.0 };
        let rate = match channel {
            FadeChannel::Reveal => rates.reveal,
            FadeChannel::ShadowGlow if target > *value => rates.glow_in,
            FadeChannel::ShadowGlow => rates.glow_out,
        };
        *value = (*value + clamp_step(target - *value, rate * dt)).clamp(0.0, 1.0);
        *last = Some(frame);
        *value
    }
}

/// Per-entity fade state plus the shared frame clock.
#[derive(Debug, Clone)]
pub struct FadeController {
    clock: FrameClock,
    states: ComponentColumn<FadeState>,
    rates: FadeRates,
    visible_threshold: f64,
}

impl FadeController {
    pub fn new(rates: FadeRates, visible_threshold: f64) -> Self {
        Self {
            clock: FrameClock::new(),
            states: ComponentColumn::new(),
            rates,
            visible_threshold,
        }
    }

    pub fn from_config(config: &LightConfig) -> Self {
        Self::new(config.fade, config.visible_threshold)
    }

    /// Advance the shared clock to `now`. The only place the clock moves;
    /// see [`FrameClock`] for the once-per-frame contract.
    pub fn begin_frame(&mut self, now: f64) -> f64 {
        self.clock.advance(now)
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn rates(&self) -> &FadeRates {
        &self.rates
    }

    /// Reveal alpha for `entity` this frame.
    ///
    /// `now` must be the timestamp given to [`begin_frame`](Self::begin_frame).
    /// It is only checked: the clock advances in `begin_frame` and nowhere
    /// else. New entities start fully hidden. A stale handle (its index
    /// already reused by a newer entity) reads as `0.0`.
    pub fn reveal_alpha(&mut self, entity: EntityId, is_visible: bool, now: f64) -> f64 {
        self.step(entity, FadeChannel::Reveal, is_visible, now)
    }

    /// Shadow-glow alpha for `entity` this frame.
    pub fn shadow_glow_alpha(&mut self, entity: EntityId, spotted_in_shade: bool, now: f64) -> f64 {
        self.step(entity, FadeChannel::ShadowGlow, spotted_in_shade, now)
    }

    /// Current state without stepping.
    pub fn state(&self, entity: EntityId) -> Option<&FadeState> {
        self.states.get(entity)
    }

    /// Whether `entity` is visible enough to draw. Untracked entities are not.
    pub fn is_renderable(&self, entity: EntityId) -> bool {
        self.states
            .get(entity)
            .is_some_and(|s| s.reveal > self.visible_threshold)
    }

    /// Drop `entity`'s state now instead of waiting for its index to be
    /// reused.
    pub fn forget(&mut self, entity: EntityId) -> bool {
        self.states.remove(entity).is_some()
    }

    /// Number of occupied state slots.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    fn step(&mut self, entity: EntityId, channel: FadeChannel, on: bool, now: f64) -> f64 {
        if !self.clock.is_current(now) {
            warn!(
                now,
                frame_started = ?self.clock.last_timestamp(),
                ?channel,
                "fade query for a frame that was never begun; using the current frame"
            );
        }
        let (dt, frame) = (self.clock.dt(), self.clock.frame());
        let rates = self.rates;
        match self.states.get_or_insert_with(entity, FadeState::default) {
            Ok(state) => state.step(channel, on, dt, frame, &rates),
            Err(err) => {
                warn!(%err, ?channel, "fade query for stale entity");
                0.0
            }
        }
    }
}

impl Default for FadeController {
    fn default() -> Self {
        Self::new(FadeRates::default(), DEFAULT_VISIBLE_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: FadeRates = FadeRates {
        reveal: 20.0,
        glow_in: 10.0,
        glow_out: 1.0,
    };

    #[test]
    fn clamp_step_snaps_or_limits() {
        assert_eq!(clamp_step(0.1, 0.2), 0.1);
        assert_eq!(clamp_step(1.0, 0.25), 0.25);
        assert_eq!(clamp_step(-1.0, 0.25), -0.25);
        assert_eq!(clamp_step(0.5, -1.0), 0.0);
    }

    #[test]
    fn large_step_lands_exactly_on_target() {
        let mut s = FadeState::default();
        assert_eq!(s.step(FadeChannel::Reveal, true, 0.1, 1, &RATES), 1.0);
    }

    #[test]
    fn near_target_snaps_without_overshoot() {
        let rates = FadeRates {
            reveal: 2.0,
            ..RATES
        };
        let mut s = FadeState::new(0.9, 0.0);
        assert_eq!(s.step(FadeChannel::Reveal, true, 0.1, 1, &rates), 1.0);
    }

    #[test]
    fn glow_rises_faster_than_it_falls() {
        let mut s = FadeState::default();
        let up = s.step(FadeChannel::ShadowGlow, true, 0.05, 1, &RATES);
        assert!((up - 0.5).abs() < 1e-12);
        s.step(FadeChannel::ShadowGlow, true, 0.05, 2, &RATES);
        assert_eq!(s.glow(), 1.0);
        let down = s.step(FadeChannel::ShadowGlow, false, 0.05, 3, &RATES);
        assert!((down - 0.95).abs() < 1e-12);
    }

    #[test]
    fn channel_steps_once_per_frame() {
        let mut s = FadeState::default();
        let rates = FadeRates { reveal: 1.0, ..RATES };
        let a = s.step(FadeChannel::Reveal, true, 0.1, 7, &rates);
        let b = s.step(FadeChannel::Reveal, true, 0.1, 7, &rates);
        assert_eq!(a, b);
    }

    #[test]
    fn controller_fades_in_over_frames() {
        let mut fade = FadeController::new(FadeRates { reveal: 2.0, ..RATES }, 0.01);
        let e = EntityId::new(0, 0);
        fade.begin_frame(0.0);
        assert_eq!(fade.reveal_alpha(e, true, 0.0), 0.0);
        assert!(!fade.is_renderable(e));

        fade.begin_frame(0.25);
        let a = fade.reveal_alpha(e, true, 0.25);
        assert!((a - 0.5).abs() < 1e-12);
        assert!(fade.is_renderable(e));
        assert_eq!(fade.reveal_alpha(e, true, 0.25), a, "same frame, same alpha");

        fade.begin_frame(1.0);
        assert_eq!(fade.reveal_alpha(e, true, 1.0), 1.0);
    }

    #[test]
    fn queries_never_advance_the_clock() {
        let mut fade = FadeController::new(FadeRates { reveal: 2.0, ..RATES }, 0.01);
        let e = EntityId::new(1, 0);
        fade.begin_frame(0.0);
        fade.reveal_alpha(e, true, 0.0);
        fade.begin_frame(0.25);

        // A mismatched timestamp still reads this frame's dt and frame number.
        let a = fade.reveal_alpha(e, true, 0.5);
        assert!((a - 0.5).abs() < 1e-12);
        assert_eq!(fade.clock().frame(), 2);
        assert_eq!(fade.clock().last_timestamp(), Some(0.25));
        assert_eq!(fade.reveal_alpha(e, true, 0.75), a);
    }

    #[test]
    fn recycled_entity_starts_fresh() {
        let mut fade = FadeController::new(RATES, 0.01);
        let old = EntityId::new(4, 0);
        fade.begin_frame(0.0);
        fade.reveal_alpha(old, true, 0.0);
        fade.begin_frame(1.0);
        fade.reveal_alpha(old, true, 1.0);
        assert_eq!(fade.state(old).map(FadeState::reveal), Some(1.0));

        let new = old.successor();
        fade.begin_frame(2.0);
        assert_eq!(fade.reveal_alpha(new, false, 2.0), 0.0);
        assert_eq!(fade.tracked(), 1);
        assert_eq!(fade.reveal_alpha(old, true, 2.0), 0.0, "stale handle reads hidden");
    }

    #[test]
    fn forget_removes_state() {
        let mut fade = FadeController::default();
        let e = EntityId::new(0, 0);
        fade.begin_frame(0.0);
        fade.shadow_glow_alpha(e, true, 0.0);
        assert!(fade.forget(e));
        assert!(fade.state(e).is_none());
        assert!(!fade.forget(e));
    }
}

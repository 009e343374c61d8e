//! The shared per-frame clock.
//!
//! Every fade update in a frame uses the same elapsed time, computed once from
//! the difference between this frame's timestamp and the previous one.
//!
//! # Contract
//!
//! Advance the clock once per frame, before any fade query. Advancing with
//! the same timestamp again is a no-op, so a frame whose queries all pass the
//! same `now` is safe. Advancing twice with different timestamps inside one
//! logical frame splits the frame's elapsed time and makes the fade rate
//! meaningless; nothing here can detect that.

use tracing::warn;

/// Elapsed time shared by every consumer in a frame.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    dt: f64,
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the frame stamped `now` (seconds) and return its elapsed
    /// time.
    ///
    /// The first advance of a session yields `0.0`. A repeated `now` leaves
    /// the clock untouched. A timestamp that goes backwards or is not finite
    /// yields `0.0`; a non-finite one is also not remembered, so the next
    /// frame measures from the last good timestamp.
    pub fn advance(&mut self, now: f64) -> f64 {
        if !now.is_finite() {
            warn!(now, "non-finite frame timestamp; treating as zero elapsed");
            self.dt = 0.0;
            self.frame += 1;
            return 0.0;
        }
        let dt = match self.last_timestamp {
            None => 0.0,
            Some(prev) if now == prev => return self.dt,
            Some(prev) if now < prev => {
                warn!(prev, now, "frame clock went backwards; treating as zero elapsed");
                0.0
            }
            Some(prev) => now - prev,
        };
        self.last_timestamp = Some(now);
        self.dt = dt;
        self.frame += 1;
        dt
    }

    /// Elapsed seconds for the current frame.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of distinct frames seen. `0` before the first advance.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Whether the clock has already been advanced to `now`.
    pub fn is_current(&self, now: f64) -> bool {
        self.last_timestamp == Some(now)
    }

    /// Start a new session; the next advance yields zero elapsed time.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

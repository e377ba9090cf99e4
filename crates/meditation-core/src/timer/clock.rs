//! Session clock.
//!
//! Holds the elapsed time of the current session and turns external stimuli
//! (ticks and scrub gestures) into time deltas. It has no thread and no timer
//! of its own - the controller calls `tick()` whenever its tick source fires.
//!
//! ## Events
//!
//! ```text
//! tick / scrub -> [PhaseChanged { from, to }] -> [Completed]
//! ```
//!
//! `Completed` is reported once, on the step that brings elapsed time up to
//! the total. Elapsed time is always clamped to `[0, total]`.

use serde::{Deserialize, Serialize};

use super::session::{Phase, SessionConfig};
use crate::error::ValidationError;

/// Scrub tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockTuning {
    /// Velocities with magnitude at or below this are ignored.
    pub pan_threshold: f64,
    /// Fraction of the session total skipped per unit of velocity.
    pub rewind_skip_fraction: f64,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            pan_threshold: 3.0,
            rewind_skip_fraction: 0.0001,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    PhaseChanged { from: Phase, to: Phase },
    Completed,
}

#[derive(Debug, Clone)]
pub struct SessionClock {
    config: SessionConfig,
    elapsed_seconds: f64,
    tuning: ClockTuning,
}

impl SessionClock {
    /// An unconfigured clock. Its total is zero, so ticks are ignored until
    /// `configure` succeeds.
    pub fn new(tuning: ClockTuning) -> Self {
        Self {
            config: SessionConfig::new(0, 0),
            elapsed_seconds: 0.0,
            tuning,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.config.total_seconds()
    }

    pub fn phase(&self) -> Phase {
        self.config.phase_at(self.elapsed_seconds)
    }

    pub fn is_configured(&self) -> bool {
        self.total_seconds() > 0
    }

    pub fn is_complete(&self) -> bool {
        self.is_configured() && self.elapsed_seconds >= self.total_seconds() as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the session and rewind to zero.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] for a zero total; the
    /// previous session is left untouched.
    pub fn configure(&mut self, config: SessionConfig) -> Result<(), ValidationError> {
        config.validate()?;
        self.config = config;
        self.elapsed_seconds = 0.0;
        Ok(())
    }

    /// Advance by one time unit. A no-op once the total is reached.
    pub fn tick(&mut self) -> Vec<ClockEvent> {
        let total = self.total_seconds() as f64;
        if self.elapsed_seconds >= total {
            return Vec::new();
        }
        self.move_to((self.elapsed_seconds + 1.0).min(total))
    }

    /// Nudge elapsed time by an amount proportional to gesture velocity.
    ///
    /// A full-width pan only trims a small slice of the session; it never
    /// seeks to an arbitrary point.
    pub fn scrub(&mut self, velocity: f64) -> Vec<ClockEvent> {
        if velocity.is_nan() || velocity.abs() <= self.tuning.pan_threshold {
            return Vec::new();
        }
        let total = self.total_seconds() as f64;
        let skip = total * self.tuning.rewind_skip_fraction * velocity;
        // 0 * inf
        if skip.is_nan() {
            return Vec::new();
        }
        let target = (self.elapsed_seconds + skip).clamp(0.0, total);
        self.move_to(target)
    }

    /// Rewind to zero. Phase follows back to `Meditate`.
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0.0;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn move_to(&mut self, target: f64) -> Vec<ClockEvent> {
        let from_phase = self.phase();
        let was_complete = self.is_complete();

        self.elapsed_seconds = target;

        let mut events = Vec::new();
        let to_phase = self.phase();
        if to_phase != from_phase {
            events.push(ClockEvent::PhaseChanged {
                from: from_phase,
                to: to_phase,
            });
        }
        if !was_complete && self.is_complete() {
            events.push(ClockEvent::Completed);
        }
        events
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(ClockTuning::default())
    }
}

//! Session data model.
//!
//! A session is two back-to-back intervals: meditate, then an optional rest.
//! The current [`Phase`] is never stored; it is always derived from the
//! elapsed time so the two cannot drift apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const SECONDS_PER_MINUTE: u64 = 60;

/// Durations of one session. Immutable once handed to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub meditate_seconds: u64,
    pub rest_seconds: u64,
}

impl SessionConfig {
    pub const fn new(meditate_seconds: u64, rest_seconds: u64) -> Self {
        Self {
            meditate_seconds,
            rest_seconds,
        }
    }

    /// Build from picker minutes.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub const fn from_minutes(meditate_min: u64, rest_min: u64) -> Self {
        Self::new(
            meditate_min.saturating_mul(SECONDS_PER_MINUTE),
            rest_min.saturating_mul(SECONDS_PER_MINUTE),
        )
    }

    pub const fn total_seconds(&self) -> u64 {
        self.meditate_seconds.saturating_add(self.rest_seconds)
    }

    /// Zero-length sessions are rejected rather than completing instantly.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] when the total is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_seconds() == 0 {
            return Err(ValidationError::InvalidConfig {
                meditate_seconds: self.meditate_seconds,
                rest_seconds: self.rest_seconds,
            });
        }
        Ok(())
    }

    /// Phase at the given elapsed time.
    ///
    /// A session without rest stays in `Meditate` up to and including its end.
    pub fn phase_at(&self, elapsed_seconds: f64) -> Phase {
        if self.rest_seconds > 0 && elapsed_seconds >= self.meditate_seconds as f64 {
            Phase::Rest
        } else {
            Phase::Meditate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Meditate,
    Rest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Meditate => f.write_str("meditate"),
            Phase::Rest => f.write_str("rest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    /// Finished; the alert loop runs until acknowledged.
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Read-only view published to presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub run_state: RunState,
    pub phase: Phase,
    pub elapsed_seconds: f64,
    pub total_seconds: u64,
}

impl SessionSnapshot {
    pub fn remaining_seconds(&self) -> f64 {
        (self.total_seconds as f64 - self.elapsed_seconds).max(0.0)
    }

    /// 0.0 .. 1.0 progress across the whole session.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds / self.total_seconds as f64).clamp(0.0, 1.0)
    }

    /// Elapsed time as `MM:SS`.
    pub fn format_elapsed(&self) -> String {
        format_mmss(self.elapsed_seconds as u64)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            run_state: RunState::Idle,
            phase: Phase::Meditate,
            elapsed_seconds: 0.0,
            total_seconds: 0,
        }
    }
}

/// Format whole seconds as `MM:SS`. Minutes wrap at the hour.
pub fn format_mmss(seconds: u64) -> String {
    let minutes = seconds / SECONDS_PER_MINUTE % 60;
    let seconds = seconds % SECONDS_PER_MINUTE;
    format!("{minutes:02}:{seconds:02}")
}

/// Durations offered by the pickers, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationOptions {
    #[serde(default = "default_meditate_minutes")]
    pub meditate_minutes: Vec<u64>,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: Vec<u64>,
}

fn default_meditate_minutes() -> Vec<u64> {
    vec![5, 10, 15]
}

fn default_rest_minutes() -> Vec<u64> {
    vec![0, 1, 2, 3, 4, 5]
}

impl Default for DurationOptions {
    fn default() -> Self {
        Self {
            meditate_minutes: default_meditate_minutes(),
            rest_minutes: default_rest_minutes(),
        }
    }
}

impl DurationOptions {
    /// Stored meditate minutes if supported, otherwise the first option.
    pub fn resolve_meditate(&self, stored: Option<u64>) -> u64 {
        resolve(&self.meditate_minutes, stored)
    }

    /// Stored rest minutes if supported, otherwise the first option.
    pub fn resolve_rest(&self, stored: Option<u64>) -> u64 {
        resolve(&self.rest_minutes, stored)
    }

    pub fn check_meditate(&self, minutes: u64) -> Result<(), ValidationError> {
        check("meditate", &self.meditate_minutes, minutes)
    }

    pub fn check_rest(&self, minutes: u64) -> Result<(), ValidationError> {
        check("rest", &self.rest_minutes, minutes)
    }
}

fn resolve(options: &[u64], stored: Option<u64>) -> u64 {
    stored
        .filter(|m| options.contains(m))
        .or_else(|| options.first().copied())
        .unwrap_or(0)
}

fn check(field: &'static str, options: &[u64], minutes: u64) -> Result<(), ValidationError> {
    if options.contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedDuration {
            field,
            minutes,
            supported: options.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_is_derived_from_elapsed() {
        let config = SessionConfig::new(300, 60);
        assert_eq!(config.phase_at(0.0), Phase::Meditate);
        assert_eq!(config.phase_at(299.9), Phase::Meditate);
        assert_eq!(config.phase_at(300.0), Phase::Rest);
        assert_eq!(config.phase_at(360.0), Phase::Rest);
    }

    #[test]
    fn zero_rest_never_reports_rest() {
        let config = SessionConfig::new(5, 0);
        assert_eq!(config.phase_at(5.0), Phase::Meditate);
    }

    #[test]
    fn zero_total_is_invalid() {
        let err = SessionConfig::new(0, 0).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidConfig {
                meditate_seconds: 0,
                rest_seconds: 0
            }
        );
        assert!(SessionConfig::new(0, 60).validate().is_ok());
    }

    #[test]
    fn from_minutes_converts() {
        let config = SessionConfig::from_minutes(10, 2);
        assert_eq!(config.meditate_seconds, 600);
        assert_eq!(config.total_seconds(), 720);
    }

    #[test]
    fn mmss_formatting() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(65), "01:05");
        assert_eq!(format_mmss(3600 + 61), "01:01");
    }

    #[test]
    fn snapshot_progress_and_remaining() {
        let snap = SessionSnapshot {
            run_state: RunState::Running,
            phase: Phase::Meditate,
            elapsed_seconds: 90.0,
            total_seconds: 360,
        };
        assert_eq!(snap.progress(), 0.25);
        assert_eq!(snap.remaining_seconds(), 270.0);
        assert_eq!(snap.format_elapsed(), "01:30");
        assert_eq!(SessionSnapshot::default().progress(), 0.0);
    }

    #[test]
    fn options_fall_back_to_first_entry() {
        let options = DurationOptions::default();
        assert_eq!(options.resolve_meditate(None), 5);
        assert_eq!(options.resolve_meditate(Some(10)), 10);
        assert_eq!(options.resolve_meditate(Some(7)), 5);
        assert_eq!(options.resolve_rest(None), 0);
        assert_eq!(options.resolve_rest(Some(3)), 3);
    }

    #[test]
    fn unsupported_option_is_rejected() {
        let options = DurationOptions::default();
        assert!(options.check_meditate(15).is_ok());
        assert!(matches!(
            options.check_rest(9),
            Err(ValidationError::UnsupportedDuration { field: "rest", minutes: 9, .. })
        ));
    }
}

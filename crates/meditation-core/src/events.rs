use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, RunState};

/// Every state change of a session produces an Event.
/// Hosts print or forward them; presentation layers use snapshots instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionConfigured {
        meditate_seconds: u64,
        rest_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionStarted {
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_seconds: f64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_seconds: f64,
        at: DateTime<Utc>,
    },
    /// Host lost foreground focus while running; the session was paused.
    SessionInterrupted {
        elapsed_seconds: f64,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        from: RunState,
        elapsed_seconds: f64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        elapsed_seconds: f64,
        at: DateTime<Utc>,
    },
    Scrubbed {
        velocity: f64,
        from_seconds: f64,
        to_seconds: f64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    /// The completion cue was replayed by the alert loop.
    AlertRepeated {
        repeat: u32,
        at: DateTime<Utc>,
    },
    CompletionAcknowledged {
        repeats: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name, used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionConfigured { .. } => "session_configured",
            Event::SessionStarted { .. } => "session_started",
            Event::SessionResumed { .. } => "session_resumed",
            Event::SessionPaused { .. } => "session_paused",
            Event::SessionInterrupted { .. } => "session_interrupted",
            Event::SessionCancelled { .. } => "session_cancelled",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::Scrubbed { .. } => "scrubbed",
            Event::SessionCompleted { .. } => "session_completed",
            Event::AlertRepeated { .. } => "alert_repeated",
            Event::CompletionAcknowledged { .. } => "completion_acknowledged",
        }
    }
}

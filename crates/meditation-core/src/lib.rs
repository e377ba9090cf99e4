//! # Meditation Core Library
//!
//! This library provides the session engine for the meditation timer: a
//! meditate interval followed by an optional rest interval, with pause and
//! resume, scrubbing, a cue at the phase boundary and a repeating completion
//! alert until the user acknowledges it. Hosts (the CLI, or any GUI) supply
//! the tick source, sound output and preference storage; the engine exposes
//! only state and commands.
//!
//! ## Architecture
//!
//! - **Session Clock**: elapsed time, ticking, scrubbing and phase detection
//! - **Session Controller**: run state machine, subscriptions, cues and the
//!   alert loop
//! - **Ports**: traits for the host's tick source, cue sink and duration store
//! - **Storage**: TOML configuration and SQLite persistence
//!
//! ## Key Components
//!
//! - [`SessionController`]: run/pause/cancel/complete state machine
//! - [`SessionClock`]: authoritative elapsed time
//! - [`Config`]: application configuration management
//! - [`Database`]: durations and completed-session persistence

pub mod error;
pub mod events;
pub mod ports;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use ports::{CueKind, CueSink, DurationStore, ManualTickSource, TickSource, TimerRole};
pub use storage::{Config, Database};
pub use timer::{
    ClockEvent, ClockTuning, ControllerSettings, DurationOptions, Phase, RunState, SessionClock,
    SessionConfig, SessionController, SessionSnapshot,
};

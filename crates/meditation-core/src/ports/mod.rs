//! Collaborator boundary.
//!
//! The session engine never owns a real timer, speaker or disk. It talks to
//! the host through these traits:
//!
//! - [`TickSource`]: recurring signals with synchronous cancellation
//! - [`CueSink`]: fire-and-forget sound cues
//! - [`DurationStore`]: the user's last-chosen durations

mod cue;
mod store;
mod tick;

pub use cue::{CueKind, CueRecord, CueSink, RecordingCueSink, SilentCueSink};
pub use store::{load_preferred_config, save_durations, DurationStore, MemoryDurationStore};
pub use tick::{ManualTickSource, Subscription, SubscriptionId, TickSource, TimerRole};

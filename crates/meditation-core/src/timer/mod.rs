mod clock;
mod controller;
mod session;

pub use clock::{ClockEvent, ClockTuning, SessionClock};
pub use controller::{ControllerSettings, SessionController};
pub use session::{
    format_mmss, DurationOptions, Phase, RunState, SessionConfig, SessionSnapshot,
    SECONDS_PER_MINUTE,
};

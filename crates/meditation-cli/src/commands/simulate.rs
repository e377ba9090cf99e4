//! Deterministic replay of a session.
//!
//! Drives the controller with a manual tick source, so a whole session runs
//! instantly and always prints the same event sequence. Uses default tuning
//! regardless of the config file.

use clap::Args;
use meditation_core::ports::RecordingCueSink;
use meditation_core::{
    ClockTuning, ControllerSettings, ManualTickSource, RunState, SessionConfig, SessionController,
    SessionSnapshot, TimerRole,
};
use serde::Serialize;

use super::emit;

#[derive(Args)]
pub struct SimulateArgs {
    #[arg(long)]
    pub meditate_seconds: u64,
    #[arg(long, default_value_t = 0)]
    pub rest_seconds: u64,
    /// Ticks to deliver (default: enough to finish the session)
    #[arg(long)]
    pub ticks: Option<u64>,
    /// Scrub velocity applied right after start (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    pub scrub: Vec<f64>,
    /// Pause after this many ticks and resume immediately
    #[arg(long)]
    pub interrupt_at: Option<u64>,
    /// Alert replays to deliver once completed
    #[arg(long, default_value_t = 0)]
    pub alerts: u32,
    /// Leave a completed session unacknowledged
    #[arg(long)]
    pub no_ack: bool,
}

#[derive(Serialize)]
struct Summary {
    #[serde(rename = "type")]
    kind: &'static str,
    snapshot: SessionSnapshot,
    cues_played: usize,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = SessionController::new(
        ManualTickSource::new(),
        RecordingCueSink::new(),
        ControllerSettings::default(),
        ClockTuning::default(),
    );
    let config = SessionConfig::new(args.meditate_seconds, args.rest_seconds);
    emit(&controller.configure(config)?)?;
    emit(&controller.start())?;

    for velocity in &args.scrub {
        emit(&controller.scrub(*velocity))?;
    }

    let ticks = args.ticks.unwrap_or_else(|| config.total_seconds());
    for n in 1..=ticks {
        emit(&controller.fire(TimerRole::Tick))?;
        if args.interrupt_at == Some(n) {
            emit(&controller.notify_interrupted())?;
            emit(&controller.start())?;
        }
    }

    if controller.run_state() == RunState::Completed {
        for _ in 0..args.alerts {
            emit(&controller.fire(TimerRole::Alert))?;
        }
        if !args.no_ack {
            emit(&controller.acknowledge())?;
        }
    }

    let summary = Summary {
        kind: "Summary",
        snapshot: controller.snapshot(),
        cues_played: controller.cues().played(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

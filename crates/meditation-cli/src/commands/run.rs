use std::str::FromStr;

use chrono::Utc;
use clap::Args;
use meditation_core::ports::{load_preferred_config, save_durations, CueSink, SilentCueSink};
use meditation_core::{Config, Database, DurationOptions, Event, SessionConfig, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::emit;
use crate::host::{BellCueSink, IntervalTickSource};

#[derive(Args)]
pub struct RunArgs {
    /// Meditate minutes (defaults to the last choice)
    #[arg(long)]
    pub meditate: Option<u64>,
    /// Rest minutes (defaults to the last choice)
    #[arg(long)]
    pub rest: Option<u64>,
    /// Do not ring the terminal bell
    #[arg(long)]
    pub silent: bool,
}

/// A line typed at the session prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Cancel,
    Scrub(f64),
    Acknowledge,
    Interrupt,
    Status,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("start" | "s" | "resume") => SessionCommand::Start,
            Some("pause" | "p") => SessionCommand::Pause,
            Some("cancel" | "c") => SessionCommand::Cancel,
            Some("ack" | "ok" | "acknowledge") => SessionCommand::Acknowledge,
            Some("interrupt") => SessionCommand::Interrupt,
            Some("status" | "st") => SessionCommand::Status,
            Some("quit" | "q" | "exit") => SessionCommand::Quit,
            Some("scrub") => {
                let velocity = words
                    .next()
                    .ok_or("scrub needs a velocity, e.g. `scrub -250`")?
                    .parse::<f64>()
                    .map_err(|e| format!("bad velocity: {e}"))?;
                SessionCommand::Scrub(velocity)
            }
            Some(other) => return Err(format!("unknown command: {other}")),
            None => return Err("empty command".into()),
        };
        match words.next() {
            Some(extra) => Err(format!("unexpected argument: {extra}")),
            None => Ok(command),
        }
    }
}

enum Input {
    Fired(meditation_core::ports::SubscriptionId),
    Line(String),
    Eof,
    CtrlC,
}

const HELP: &str = "commands: start | pause | scrub <velocity> | cancel | ack | interrupt | status | quit";

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session_loop(args))
}

/// Explicit durations are validated and remembered like a picker choice.
fn resolve_session(
    db: &mut Database,
    options: &DurationOptions,
    meditate: Option<u64>,
    rest: Option<u64>,
) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let preferred = load_preferred_config(db, options)?;
    if meditate.is_none() && rest.is_none() {
        return Ok(preferred);
    }
    let meditate = meditate.unwrap_or(preferred.meditate_seconds / 60);
    let rest = rest.unwrap_or(preferred.rest_seconds / 60);
    save_durations(db, options, meditate, rest)?;
    Ok(SessionConfig::from_minutes(meditate, rest))
}

async fn session_loop(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut db = Database::open()?;
    let session = resolve_session(&mut db, &config.options, args.meditate, args.rest)?;

    let cues: Box<dyn CueSink> = if args.silent {
        Box::new(SilentCueSink)
    } else {
        Box::new(BellCueSink)
    };
    let mut controller = SessionController::new(
        IntervalTickSource::new(),
        cues,
        config.controller_settings(),
        config.clock_tuning(),
    );
    emit(&controller.configure(session)?)?;
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            id = controller.tick_source_mut().next_fire() => Input::Fired(id),
            line = lines.next_line() => match line? {
                Some(line) => Input::Line(line),
                None => Input::Eof,
            },
            _ = tokio::signal::ctrl_c() => Input::CtrlC,
        };

        let events = match input {
            Input::Fired(id) => controller.on_fired(id),
            Input::Line(line) if line.trim().is_empty() => continue,
            Input::Line(line) => match line.parse::<SessionCommand>() {
                Ok(SessionCommand::Start) => controller.start(),
                Ok(SessionCommand::Pause) => controller.pause(),
                Ok(SessionCommand::Cancel) => controller.cancel(),
                Ok(SessionCommand::Scrub(velocity)) => controller.scrub(velocity),
                Ok(SessionCommand::Acknowledge) => controller.acknowledge(),
                Ok(SessionCommand::Interrupt) => controller.notify_interrupted(),
                Ok(SessionCommand::Status) => {
                    let snapshot = controller.snapshot();
                    println!("{}", serde_json::to_string(&snapshot)?);
                    eprintln!(
                        "{} {} {} / {}",
                        snapshot.run_state,
                        snapshot.phase,
                        snapshot.format_elapsed(),
                        meditation_core::timer::format_mmss(snapshot.total_seconds)
                    );
                    continue;
                }
                Ok(SessionCommand::Quit) => break,
                Err(message) => {
                    eprintln!("{message}\n{HELP}");
                    continue;
                }
            },
            Input::Eof => break,
            // First ctrl-c pauses a running session; otherwise it exits.
            Input::CtrlC => {
                let events = controller.notify_interrupted();
                if events.is_empty() {
                    break;
                }
                events
            }
        };

        if events
            .iter()
            .any(|e| matches!(e, Event::SessionCompleted { .. }))
        {
            if let Err(e) = db.record_session(controller.clock().config(), Utc::now()) {
                warn!(error = %e, "could not record completed session");
            }
        }
        emit(&events)?;
    }

    emit(&controller.cancel())?;
    info!("session loop finished");
    Ok(())
}

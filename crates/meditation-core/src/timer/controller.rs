//! Session controller.
//!
//! Owns the run state and both recurring subscriptions (ticking while
//! running, the alert loop once completed). Commands are total over every
//! state: anything that does not apply is silently ignored and returns no
//! events.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -start-> Running -pause/interrupt-> Paused -start-> Running
//! Running -(clock completes)-> Completed -acknowledge-> Idle
//! {Running, Paused, Completed} -cancel-> Idle
//! ```
//!
//! At most one subscription is live at any time: the tick subscription only
//! while `Running`, the alert subscription only while `Completed`.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use super::clock::{ClockEvent, ClockTuning, SessionClock};
use super::session::{Phase, RunState, SessionConfig, SessionSnapshot};
use crate::error::ValidationError;
use crate::events::Event;
use crate::ports::{CueKind, CueSink, ManualTickSource, SubscriptionId, TickSource, TimerRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Length of one time unit; the tick subscription fires once per unit.
    pub unit: Duration,
    /// Alert loop replay interval, in units.
    pub alert_repeat_units: u32,
}

impl ControllerSettings {
    pub fn tick_every(&self) -> Duration {
        self.unit
    }

    pub fn alert_every(&self) -> Duration {
        self.unit.saturating_mul(self.alert_repeat_units.max(1))
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            alert_repeat_units: 3,
        }
    }
}

pub struct SessionController<T: TickSource, C: CueSink> {
    clock: SessionClock,
    run_state: RunState,
    ticks: T,
    cues: C,
    settings: ControllerSettings,
    tick_sub: Option<SubscriptionId>,
    alert_sub: Option<SubscriptionId>,
    /// Replays delivered by the current alert loop.
    alert_repeats: u32,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<T: TickSource, C: CueSink> SessionController<T, C> {
    pub fn new(ticks: T, cues: C, settings: ControllerSettings, tuning: ClockTuning) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            clock: SessionClock::new(tuning),
            run_state: RunState::Idle,
            ticks,
            cues,
            settings,
            tick_sub: None,
            alert_sub: None,
            alert_repeats: 0,
            snapshot_tx,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    pub fn alert_repeats(&self) -> u32 {
        self.alert_repeats
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            run_state: self.run_state,
            phase: self.clock.phase(),
            elapsed_seconds: self.clock.elapsed_seconds(),
            total_seconds: self.clock.total_seconds(),
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn tick_source(&self) -> &T {
        &self.ticks
    }

    /// Mutable access for hosts that need to poll their source.
    /// Subscriptions must only be created and cancelled by the controller.
    pub fn tick_source_mut(&mut self) -> &mut T {
        &mut self.ticks
    }

    pub fn cues(&self) -> &C {
        &self.cues
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the session wholesale and return to `Idle`.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] for a zero-length session.
    /// The current session, run state and subscriptions are left untouched.
    pub fn configure(&mut self, config: SessionConfig) -> Result<Vec<Event>, ValidationError> {
        config.validate()?;
        if self.run_state == RunState::Completed {
            self.cues.stop_all_cues();
        }
        self.cancel_subscriptions();
        self.clock.configure(config)?;
        self.run_state = RunState::Idle;
        self.alert_repeats = 0;
        self.publish();
        debug!(
            meditate_seconds = config.meditate_seconds,
            rest_seconds = config.rest_seconds,
            "session configured"
        );
        Ok(vec![Event::SessionConfigured {
            meditate_seconds: config.meditate_seconds,
            rest_seconds: config.rest_seconds,
            at: Utc::now(),
        }])
    }

    /// Start from `Idle` or resume from `Paused`.
    pub fn start(&mut self) -> Vec<Event> {
        match self.run_state {
            RunState::Idle => {
                if !self.clock.is_configured() {
                    debug!("start ignored: no session configured");
                    return Vec::new();
                }
                self.subscribe_ticks();
                self.run_state = RunState::Running;
                self.publish();
                info!(total_seconds = self.clock.total_seconds(), "session started");
                vec![Event::SessionStarted {
                    total_seconds: self.clock.total_seconds(),
                    at: Utc::now(),
                }]
            }
            RunState::Paused => {
                self.subscribe_ticks();
                self.run_state = RunState::Running;
                self.publish();
                debug!(elapsed = self.clock.elapsed_seconds(), "session resumed");
                vec![Event::SessionResumed {
                    elapsed_seconds: self.clock.elapsed_seconds(),
                    at: Utc::now(),
                }]
            }
            RunState::Running | RunState::Completed => {
                trace!(state = %self.run_state, "start ignored");
                Vec::new()
            }
        }
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if !self.halt() {
            return Vec::new();
        }
        debug!(elapsed = self.clock.elapsed_seconds(), "session paused");
        vec![Event::SessionPaused {
            elapsed_seconds: self.clock.elapsed_seconds(),
            at: Utc::now(),
        }]
    }

    /// The host lost foreground focus. Pauses a running session, keeping
    /// its progress; ignored in every other state.
    pub fn notify_interrupted(&mut self) -> Vec<Event> {
        if !self.halt() {
            return Vec::new();
        }
        info!(elapsed = self.clock.elapsed_seconds(), "session interrupted");
        vec![Event::SessionInterrupted {
            elapsed_seconds: self.clock.elapsed_seconds(),
            at: Utc::now(),
        }]
    }

    /// Abandon the session. Stops ticking, the alert loop and any cue audio
    /// before returning.
    pub fn cancel(&mut self) -> Vec<Event> {
        let from = self.run_state;
        if from == RunState::Idle {
            return Vec::new();
        }
        let elapsed_seconds = self.clock.elapsed_seconds();
        self.cancel_subscriptions();
        self.cues.stop_all_cues();
        self.clock.reset();
        self.run_state = RunState::Idle;
        self.alert_repeats = 0;
        self.publish();
        info!(%from, elapsed = elapsed_seconds, "session cancelled");
        vec![Event::SessionCancelled {
            from,
            elapsed_seconds,
            at: Utc::now(),
        }]
    }

    /// Forward a pan gesture sample to the clock. Only applies while running.
    pub fn scrub(&mut self, velocity: f64) -> Vec<Event> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        let from_seconds = self.clock.elapsed_seconds();
        let clock_events = self.clock.scrub(velocity);
        let to_seconds = self.clock.elapsed_seconds();

        let mut events = Vec::new();
        if to_seconds != from_seconds {
            trace!(velocity, from_seconds, to_seconds, "scrubbed");
            events.push(Event::Scrubbed {
                velocity,
                from_seconds,
                to_seconds,
                at: Utc::now(),
            });
        }
        self.apply(clock_events, &mut events);
        self.publish();
        events
    }

    /// Dismiss a completed session: stops the alert loop and returns to `Idle`.
    pub fn acknowledge(&mut self) -> Vec<Event> {
        if self.run_state != RunState::Completed {
            return Vec::new();
        }
        let repeats = self.alert_repeats;
        self.cancel_subscriptions();
        self.cues.stop_all_cues();
        self.clock.reset();
        self.run_state = RunState::Idle;
        self.alert_repeats = 0;
        self.publish();
        info!(repeats, "completion acknowledged");
        vec![Event::CompletionAcknowledged {
            repeats,
            at: Utc::now(),
        }]
    }

    /// Deliver one firing of a subscription.
    ///
    /// Firings of ids that are no longer live are dropped.
    pub fn on_fired(&mut self, id: SubscriptionId) -> Vec<Event> {
        if self.tick_sub == Some(id) {
            let clock_events = self.clock.tick();
            let mut events = Vec::new();
            self.apply(clock_events, &mut events);
            self.publish();
            events
        } else if self.alert_sub == Some(id) {
            self.alert_repeats += 1;
            self.cues.play_cue(CueKind::Short);
            trace!(repeat = self.alert_repeats, "alert repeated");
            vec![Event::AlertRepeated {
                repeat: self.alert_repeats,
                at: Utc::now(),
            }]
        } else {
            trace!(?id, "stale firing dropped");
            Vec::new()
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, clock_events: Vec<ClockEvent>, events: &mut Vec<Event>) {
        for event in clock_events {
            match event {
                ClockEvent::PhaseChanged { from, to } => {
                    if from == Phase::Meditate && to == Phase::Rest {
                        self.cues.play_cue(CueKind::Short);
                    }
                    info!(%from, %to, "phase changed");
                    events.push(Event::PhaseChanged {
                        from,
                        to,
                        elapsed_seconds: self.clock.elapsed_seconds(),
                        at: Utc::now(),
                    });
                }
                ClockEvent::Completed => self.complete(events),
            }
        }
    }

    fn complete(&mut self, events: &mut Vec<Event>) {
        if let Some(id) = self.tick_sub.take() {
            self.ticks.cancel(id);
        }
        self.run_state = RunState::Completed;
        self.alert_repeats = 0;
        self.cues.play_cue(CueKind::Short);
        self.alert_sub = Some(
            self.ticks
                .subscribe(TimerRole::Alert, self.settings.alert_every()),
        );
        info!(total_seconds = self.clock.total_seconds(), "session completed");
        events.push(Event::SessionCompleted {
            total_seconds: self.clock.total_seconds(),
            at: Utc::now(),
        });
    }

    /// Running -> Paused. Returns false when not running.
    fn halt(&mut self) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        if let Some(id) = self.tick_sub.take() {
            self.ticks.cancel(id);
        }
        self.run_state = RunState::Paused;
        self.publish();
        true
    }

    fn subscribe_ticks(&mut self) {
        if self.tick_sub.is_none() {
            self.tick_sub = Some(
                self.ticks
                    .subscribe(TimerRole::Tick, self.settings.tick_every()),
            );
        }
    }

    fn cancel_subscriptions(&mut self) {
        if let Some(id) = self.tick_sub.take() {
            self.ticks.cancel(id);
        }
        if let Some(id) = self.alert_sub.take() {
            self.ticks.cancel(id);
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl<C: CueSink> SessionController<ManualTickSource, C> {
    /// Fire the live subscription with the given role, if any.
    pub fn fire(&mut self, role: TimerRole) -> Vec<Event> {
        match self.ticks.find(role) {
            Some(id) => self.on_fired(id),
            None => Vec::new(),
        }
    }
}

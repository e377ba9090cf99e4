//! End-to-end session scenarios driven through the controller.

use meditation_core::ports::{CueRecord, RecordingCueSink};
use meditation_core::{
    ClockTuning, ControllerSettings, Event, ManualTickSource, Phase, RunState, SessionConfig,
    SessionController, TimerRole,
};

type Controller = SessionController<ManualTickSource, RecordingCueSink>;

fn controller(meditate: u64, rest: u64) -> Controller {
    let mut controller = SessionController::new(
        ManualTickSource::new(),
        RecordingCueSink::new(),
        ControllerSettings::default(),
        ClockTuning::default(),
    );
    controller
        .configure(SessionConfig::new(meditate, rest))
        .unwrap();
    controller
}

fn tick_n(controller: &mut Controller, n: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..n {
        events.extend(controller.fire(TimerRole::Tick));
    }
    events
}

fn phase_changes(events: &[Event]) -> Vec<(Phase, Phase)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PhaseChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_meditate_then_rest_session() {
    let mut c = controller(300, 60);
    c.start();

    let first = tick_n(&mut c, 299);
    assert!(phase_changes(&first).is_empty());
    assert_eq!(c.snapshot().phase, Phase::Meditate);

    let boundary = tick_n(&mut c, 1);
    assert_eq!(phase_changes(&boundary), vec![(Phase::Meditate, Phase::Rest)]);
    assert_eq!(c.snapshot().phase, Phase::Rest);
    assert_eq!(c.cues().played(), 1);

    let rest = tick_n(&mut c, 60);
    assert!(phase_changes(&rest).is_empty());
    assert_eq!(c.run_state(), RunState::Completed);
    assert_eq!(c.snapshot().elapsed_seconds, 360.0);
    assert_eq!(
        rest.iter()
            .filter(|e| matches!(e, Event::SessionCompleted { .. }))
            .count(),
        1
    );
}

#[test]
fn test_zero_rest_completes_without_rest_phase() {
    let mut c = controller(5, 0);
    let mut rx = c.subscribe();
    c.start();

    let mut phases = Vec::new();
    let mut events = Vec::new();
    for _ in 0..5 {
        events.extend(c.fire(TimerRole::Tick));
        phases.push(rx.borrow_and_update().phase);
    }

    assert_eq!(c.run_state(), RunState::Completed);
    assert!(phase_changes(&events).is_empty());
    assert!(phases.iter().all(|p| *p == Phase::Meditate));
}

#[test]
fn test_no_duplicate_completion_after_total() {
    let mut c = controller(3, 0);
    c.start();
    let events = tick_n(&mut c, 3);
    assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));

    // The tick subscription is gone; even a forced clock tick reports nothing.
    assert!(c.fire(TimerRole::Tick).is_empty());
    assert!(c.tick_source().find(TimerRole::Tick).is_none());
    assert_eq!(c.run_state(), RunState::Completed);
}

#[test]
fn test_interruption_preserves_progress() {
    let mut c = controller(600, 0);
    c.start();
    tick_n(&mut c, 42);

    c.notify_interrupted();
    assert_eq!(c.run_state(), RunState::Paused);
    assert_eq!(c.snapshot().elapsed_seconds, 42.0);
    assert!(c.tick_source().live().is_empty());

    c.start();
    tick_n(&mut c, 1);
    assert_eq!(c.snapshot().elapsed_seconds, 43.0);
}

#[test]
fn test_pause_resume_counts_only_delivered_ticks() {
    let mut c = controller(600, 0);
    c.start();
    tick_n(&mut c, 10);
    c.pause();
    // Firings while paused find no subscription.
    tick_n(&mut c, 10);
    c.start();
    tick_n(&mut c, 5);
    assert_eq!(c.snapshot().elapsed_seconds, 15.0);
}

#[test]
fn test_cancel_from_every_active_state() {
    // Running
    let mut c = controller(10, 5);
    c.start();
    tick_n(&mut c, 3);
    c.cancel();
    assert_eq!(c.run_state(), RunState::Idle);
    assert_eq!(c.snapshot().elapsed_seconds, 0.0);

    // Paused
    c.start();
    tick_n(&mut c, 2);
    c.pause();
    c.cancel();
    assert_eq!(c.run_state(), RunState::Idle);
    assert_eq!(c.snapshot().elapsed_seconds, 0.0);

    // Completed, with the alert loop live
    c.start();
    tick_n(&mut c, 15);
    assert_eq!(c.run_state(), RunState::Completed);
    c.fire(TimerRole::Alert);
    c.cancel();
    assert_eq!(c.run_state(), RunState::Idle);
    assert!(c.tick_source().live().is_empty());

    let played = c.cues().played();
    tick_n(&mut c, 5);
    c.fire(TimerRole::Alert);
    assert_eq!(c.cues().played(), played);
    assert_eq!(c.cues().records().last(), Some(&CueRecord::StoppedAll));
}

#[test]
fn test_alert_loop_until_acknowledged() {
    let mut c = controller(2, 1);
    c.start();
    tick_n(&mut c, 3);
    // Phase cue plus the immediate completion cue.
    assert_eq!(c.cues().played(), 2);

    for _ in 0..4 {
        c.fire(TimerRole::Alert);
    }
    assert_eq!(c.cues().played(), 6);

    let events = c.acknowledge();
    assert!(matches!(
        events.as_slice(),
        [Event::CompletionAcknowledged { repeats: 4, .. }]
    ));
    assert_eq!(c.run_state(), RunState::Idle);
    assert!(c.fire(TimerRole::Alert).is_empty());
    assert_eq!(c.cues().played(), 6);
}

#[test]
fn test_single_recurring_subscription() {
    let mut c = controller(2, 0);
    c.start();
    assert_eq!(c.tick_source().live().len(), 1);
    tick_n(&mut c, 2);
    let live = c.tick_source().live();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].role, TimerRole::Alert);
}

#[test]
fn test_scrub_across_boundary_plays_cue() {
    let mut c = controller(100, 100);
    c.start();
    tick_n(&mut c, 90);
    // 200 * 0.0001 * 1000 = 20 seconds forward.
    let events = c.scrub(1_000.0);
    assert_eq!(phase_changes(&events), vec![(Phase::Meditate, Phase::Rest)]);
    assert_eq!(c.cues().played(), 1);

    // Scrubbing back into meditate does not cue.
    c.scrub(-1_000.0);
    assert_eq!(c.snapshot().phase, Phase::Meditate);
    assert_eq!(c.cues().played(), 1);
}

#[test]
fn test_scrub_ignored_when_paused() {
    let mut c = controller(100, 0);
    c.start();
    tick_n(&mut c, 10);
    c.pause();
    assert!(c.scrub(10_000.0).is_empty());
    assert_eq!(c.snapshot().elapsed_seconds, 10.0);
}

#[test]
fn test_new_configure_overwrites_completed_session() {
    let mut c = controller(1, 0);
    c.start();
    tick_n(&mut c, 1);
    assert_eq!(c.run_state(), RunState::Completed);

    c.configure(SessionConfig::new(30, 30)).unwrap();
    assert_eq!(c.run_state(), RunState::Idle);
    assert_eq!(c.snapshot().total_seconds, 60);
    assert!(c.tick_source().live().is_empty());
    assert_eq!(c.cues().records().last(), Some(&CueRecord::StoppedAll));
}

//! Property tests for the session clock.

use meditation_core::{ClockEvent, ClockTuning, SessionClock, SessionConfig};
use proptest::prelude::*;

fn configured(meditate: u64, rest: u64) -> SessionClock {
    let mut clock = SessionClock::default();
    clock.configure(SessionConfig::new(meditate, rest)).unwrap();
    clock
}

proptest! {
    #[test]
    fn small_velocities_never_move(
        meditate in 1u64..3_600,
        rest in 0u64..600,
        ticks in 0usize..50,
        velocity in -3.0f64..=3.0,
    ) {
        let mut clock = configured(meditate, rest);
        for _ in 0..ticks {
            clock.tick();
        }
        let before = clock.elapsed_seconds();
        prop_assert!(clock.scrub(velocity).is_empty());
        prop_assert_eq!(clock.elapsed_seconds(), before);
    }

    #[test]
    fn scrubbing_stays_in_bounds(
        meditate in 1u64..3_600,
        rest in 0u64..600,
        velocities in prop::collection::vec(prop::num::f64::ANY, 1..40),
    ) {
        let mut clock = configured(meditate, rest);
        let total = clock.total_seconds() as f64;
        for v in velocities {
            clock.scrub(v);
            let elapsed = clock.elapsed_seconds();
            prop_assert!((0.0..=total).contains(&elapsed), "elapsed {} outside [0, {}]", elapsed, total);
        }
    }

    #[test]
    fn scrubbing_stays_in_bounds_for_any_tuning(
        meditate in 1u64..3_600,
        rest in 0u64..600,
        pan_threshold in 0.0f64..10.0,
        rewind_skip_fraction in prop_oneof![Just(0.0f64), 0.0f64..0.01],
        velocities in prop::collection::vec(prop::num::f64::ANY, 1..40),
    ) {
        let mut clock = SessionClock::new(ClockTuning { pan_threshold, rewind_skip_fraction });
        clock.configure(SessionConfig::new(meditate, rest)).unwrap();
        let total = clock.total_seconds() as f64;
        for v in velocities {
            clock.scrub(v);
            let elapsed = clock.elapsed_seconds();
            prop_assert!((0.0..=total).contains(&elapsed), "elapsed {} outside [0, {}]", elapsed, total);
        }
    }

    #[test]
    fn ticking_to_total_completes_once(meditate in 1u64..300, rest in 0u64..120, extra in 0usize..20) {
        let mut clock = configured(meditate, rest);
        let total = clock.total_seconds() as usize;
        let mut completions = 0;
        for _ in 0..total + extra {
            completions += clock
                .tick()
                .iter()
                .filter(|e| **e == ClockEvent::Completed)
                .count();
        }
        prop_assert_eq!(completions, 1);
        prop_assert!(clock.is_complete());
    }
}

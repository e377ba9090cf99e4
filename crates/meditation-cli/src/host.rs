//! Terminal host collaborators: a tokio-backed tick source and a bell.

use std::future::poll_fn;
use std::io::Write;
use std::task::Poll;
use std::time::Duration;

use meditation_core::ports::{CueKind, CueSink, SubscriptionId, TickSource, TimerRole};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Tick source backed by `tokio::time::Interval`.
///
/// Must be used inside a tokio runtime. Cancelling drops the interval, so a
/// cancelled subscription can never fire again.
#[derive(Debug, Default)]
pub struct IntervalTickSource {
    next_id: u64,
    live: Vec<(SubscriptionId, Interval)>,
}

impl IntervalTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the next firing of any live subscription.
    /// Pending forever while nothing is subscribed. Cancel safe.
    pub async fn next_fire(&mut self) -> SubscriptionId {
        poll_fn(|cx| {
            for (id, interval) in self.live.iter_mut() {
                if interval.poll_tick(cx).is_ready() {
                    return Poll::Ready(*id);
                }
            }
            Poll::Pending
        })
        .await
    }
}

impl TickSource for IntervalTickSource {
    fn subscribe(&mut self, role: TimerRole, every: Duration) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        // First firing one full period from now, not immediately.
        let mut interval = time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.live.push((id, interval));
        debug!(?id, ?role, ?every, "subscribed");
        id
    }

    fn cancel(&mut self, id: SubscriptionId) {
        self.live.retain(|(live_id, _)| *live_id != id);
        debug!(?id, "cancelled");
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct BellCueSink;

impl CueSink for BellCueSink {
    fn play_cue(&mut self, kind: CueKind) {
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(b"\x07").and_then(|()| err.flush()) {
            warn!(?kind, error = %e, "could not play cue");
        }
    }

    fn stop_all_cues(&mut self) {
        // A bell cannot be cut short.
    }
}

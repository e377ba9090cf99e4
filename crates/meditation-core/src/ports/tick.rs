use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a recurring subscription is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerRole {
    /// Advances the session clock by one unit.
    Tick,
    /// Replays the completion cue until acknowledged.
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// A source of recurring signals.
///
/// The host reports each firing back to the controller with the id it was
/// given. `cancel` must take effect before it returns: a cancelled id is never
/// delivered again.
pub trait TickSource {
    fn subscribe(&mut self, role: TimerRole, every: Duration) -> SubscriptionId;
    fn cancel(&mut self, id: SubscriptionId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub role: TimerRole,
    pub every: Duration,
}

/// Tick source that never fires on its own.
///
/// Keeps the set of live subscriptions; the owner decides when they fire.
/// Used for deterministic replays and in tests.
#[derive(Debug, Default)]
pub struct ManualTickSource {
    next_id: u64,
    live: Vec<Subscription>,
    /// Total subscriptions ever created.
    created: usize,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> &[Subscription] {
        &self.live
    }

    pub fn find(&self, role: TimerRole) -> Option<SubscriptionId> {
        self.live.iter().find(|s| s.role == role).map(|s| s.id)
    }

    pub fn is_live(&self, id: SubscriptionId) -> bool {
        self.live.iter().any(|s| s.id == id)
    }

    pub fn created(&self) -> usize {
        self.created
    }
}

impl TickSource for ManualTickSource {
    fn subscribe(&mut self, role: TimerRole, every: Duration) -> SubscriptionId {
        self.next_id += 1;
        self.created += 1;
        let id = SubscriptionId(self.next_id);
        self.live.push(Subscription { id, role, every });
        id
    }

    fn cancel(&mut self, id: SubscriptionId) {
        self.live.retain(|s| s.id != id);
    }
}

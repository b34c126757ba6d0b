//! Gravity timer: one owned deadline, restarted only on explicit transitions.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct TickTimer {
    deadline: Option<Instant>,
    interval: Duration,
}

impl TickTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the first tick one `interval` from `now`, replacing any pending one.
    pub fn start(&mut self, now: Instant, interval: Duration) {
        self.interval = interval;
        self.deadline = Some(now + interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Consumes a due tick and schedules the next period. Returns false if nothing was due.
    /// When more than a full period behind, the next tick lands one interval after `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        if let Some(deadline) = self.deadline {
            let next = deadline + self.interval;
            self.deadline = Some(if next <= now { now + self.interval } else { next });
        }
        true
    }

    /// Time until the next tick, or `None` when cancelled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

//! Minimum-interval debouncing
//!
//! Filesystems often emit several notifications for one logical write. A
//! write is only replicated when more than the configured interval has
//! passed since the last completed transfer; the first window opens when the
//! debouncer is created, not at the first event.

use replicator_core::ChangeEvent;
use std::time::Duration;
use tokio::time::Instant;

/// What to do with one change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Replicate now; carries the sequence number of this transfer
    Transfer(u64),
    /// Within the interval of the last transfer; drop silently
    Suppress,
    /// Anything other than a content write: the source is no longer usable
    SourceGone,
}

/// Debounce state owned by the coordinator
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_interval: Duration,
    /// Completion time of the last transfer (creation time before the first)
    last_update: Instant,
    /// Accepted transfers so far
    accepted: u64,
}

impl Debouncer {
    pub fn new(min_interval: Duration, started_at: Instant) -> Self {
        Self {
            min_interval,
            last_update: started_at,
            accepted: 0,
        }
    }

    /// Classify an event
    ///
    /// Accepting a write bumps the transfer counter. `last_update` is left
    /// alone until [`Debouncer::record_transfer`] is called.
    pub fn evaluate(&mut self, event: &ChangeEvent) -> Decision {
        if !event.kind.is_write() {
            return Decision::SourceGone;
        }

        let elapsed = event.observed_at.saturating_duration_since(self.last_update);
        if elapsed <= self.min_interval {
            return Decision::Suppress;
        }

        self.accepted += 1;
        Decision::Transfer(self.accepted)
    }

    /// Mark the end of a successful transfer
    pub fn record_transfer(&mut self, completed_at: Instant) {
        self.last_update = completed_at;
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live driver counters, updated by the worker threads.
#[derive(Debug, Default)]
pub struct DriverStats {
    frames: AtomicU64,
    events_dispatched: AtomicU64,
    events_ignored: AtomicU64,
    responses_correlated: AtomicU64,
    unsolicited_responses: AtomicU64,
    read_errors: AtomicU64,
}

/// Point-in-time copy of [`DriverStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub events_dispatched: u64,
    pub events_ignored: u64,
    pub responses_correlated: u64,
    pub unsolicited_responses: u64,
    pub read_errors: u64,
}

impl DriverStats {
    pub(crate) fn frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn event(&self, dispatched: bool) {
        let counter = if dispatched {
            &self.events_dispatched
        } else {
            &self.events_ignored
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn correlated(&self) {
        self.responses_correlated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unsolicited(&self) {
        self.unsolicited_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            responses_correlated: self.responses_correlated.load(Ordering::Relaxed),
            unsolicited_responses: self.unsolicited_responses.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

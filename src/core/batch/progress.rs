//! Running batch counters
//!
//! Workers update the counters as they go; the ticker and the final report only read them.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use super::outcome::WorkState;

/// Lock-free counters shared by all workers of a run
#[derive(Debug)]
pub struct ProgressCounters {
    total: usize,
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    in_flight: AtomicUsize,
    started: Instant,
}

/// Point-in-time copy of [`ProgressCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub in_flight: usize,
    pub elapsed_seconds: f64,
    pub rate_per_second: f64,
}

impl ProgressCounters {
    /// Counters for a run over `total` discovered documents
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// A document moved from `Queued` to `InProgress`
    pub fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    /// A document in progress reached a terminal state
    pub fn finish(&self, state: WorkState) {
        let counter = match state {
            WorkState::Succeeded => &self.succeeded,
            WorkState::Failed => &self.failed,
            WorkState::SkippedDuplicate => &self.skipped,
            WorkState::Queued | WorkState::InProgress => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
        // Saturating: a failure recorded without a matching begin must not wrap.
        let _ = self
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let processed = self.processed.load(Ordering::Relaxed);
        let elapsed_seconds = self.started.elapsed().as_secs_f64();
        ProgressSnapshot {
            total: self.total,
            processed,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            elapsed_seconds,
            rate_per_second: rate(processed, elapsed_seconds),
        }
    }
}

/// Items per second, zero when no time has elapsed
pub(crate) fn rate(count: usize, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        count as f64 / elapsed_seconds
    } else {
        0.0
    }
}

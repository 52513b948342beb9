//! Run progress accounting

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// How a single item cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Counts item outcomes for the current run
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: u64,
    succeeded: u64,
    failed: u64,
    started: Instant,
}

/// Point-in-time view of a [`ProgressTracker`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub remaining: u64,
    pub elapsed: Duration,
    /// Successes per minute, zero until a full second has passed
    pub throughput_per_minute: f64,
}

impl ProgressTracker {
    /// Starts the clock
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            started,
        }
    }

    /// Sets the number of items the run expects to process
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(self.started);
        let throughput_per_minute = if elapsed < Duration::from_secs(1) {
            0.0
        } else {
            self.succeeded as f64 / (elapsed.as_secs_f64() / 60.0)
        };

        ProgressSnapshot {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            remaining: self.total.saturating_sub(self.succeeded + self.failed),
            elapsed,
            throughput_per_minute,
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} succeeded, {} failed, {} remaining, {:.1} items/min",
            self.succeeded, self.total, self.failed, self.remaining, self.throughput_per_minute
        )
    }
}

//! Pipeline module: running discovery and synchronization end to end
//!
//! This module contains:
//! - The run state machine (`Pipeline`)
//! - Progress accounting for a run
//! - Pacing between item cycles

pub mod progress;
pub mod rate_limit;
mod runner;

pub use progress::{Outcome, ProgressSnapshot, ProgressTracker};
pub use rate_limit::{MinIntervalGate, RateLimiter};
pub use runner::Pipeline;

use crate::sync::AvailabilityReport;

/// Where a pipeline is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Discovering,
    Processing,
    Draining,
    Done,
}

/// What a completed run did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub progress: ProgressSnapshot,
    pub availability: AvailabilityReport,
}

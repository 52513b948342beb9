//! Output module for reporting on runs and the store
//!
//! This module handles:
//! - Printing store statistics
//! - Printing the summary of a finished run

pub mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};

use crate::pipeline::RunSummary;

/// Prints a finished run's summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    let progress = &summary.progress;

    println!("=== Sync Summary ===\n");
    println!("  Items discovered: {}", progress.total);
    println!("  Items synced: {}", progress.succeeded);
    println!("  Items failed: {}", progress.failed);
    println!(
        "  Availability rows written: {} ({} failed)",
        summary.availability.synced, summary.availability.failed
    );
    println!(
        "  Elapsed: {:.1}s ({:.1} items/min)",
        progress.elapsed.as_secs_f64(),
        progress.throughput_per_minute
    );
}

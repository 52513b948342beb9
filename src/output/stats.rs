//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{Gateway, RunRecord, StorageResult};
use chrono::{DateTime, Utc};

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Number of items stored
    pub items: u64,

    /// Number of locations stored
    pub locations: u64,

    /// Locations known only by their identifier
    pub placeholder_locations: u64,

    /// Number of (item, location) availability rows
    pub availability_rows: u64,

    /// Most recent pipeline run, if any
    pub latest_run: Option<RunRecord>,
}

impl CatalogStatistics {
    /// Wall-clock duration of the latest run, if it has finished
    pub fn latest_run_seconds(&self) -> Option<i64> {
        let run = self.latest_run.as_ref()?;
        let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
        let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
        Some((finished - started).num_seconds())
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `gateway` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(gateway: &dyn Gateway) -> StorageResult<CatalogStatistics> {
    Ok(CatalogStatistics {
        items: gateway.count_items()?,
        locations: gateway.count_locations()?,
        placeholder_locations: gateway.count_placeholder_locations()?,
        availability_rows: gateway.count_availability()?,
        latest_run: gateway.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Items: {}", stats.items);
    println!(
        "  Locations: {} ({} placeholders)",
        stats.locations, stats.placeholder_locations
    );
    println!("  Availability rows: {}", stats.availability_rows);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run (#{}):", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            if let Some(seconds) = stats.latest_run_seconds() {
                println!("  Duration: {}s", seconds);
            }
            println!("  Config hash: {}", run.config_hash);

            let totals = run.totals;
            let success_rate = if totals.total > 0 {
                (totals.succeeded as f64 / totals.total as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  Items: {} succeeded, {} failed of {} ({:.1}%)",
                totals.succeeded, totals.failed, totals.total, success_rate
            );
        }
        None => println!("No runs recorded yet."),
    }
}

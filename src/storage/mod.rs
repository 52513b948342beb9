//! Storage module for persisting catalog data
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Item and location persistence keyed by catalog identifiers
//! - Conflict-resolving availability writes
//! - The run ledger

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteGateway;
pub use traits::{Gateway, StorageError, StorageResult};

use crate::catalog::ItemRecord;
use std::path::Path;

/// Opens (creating if needed) a gateway over the database at `path`
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteGateway)` - Successfully opened database with schema in place
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_gateway(path: &Path) -> StorageResult<SqliteGateway> {
    SqliteGateway::new(path)
}

/// A persisted item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub id: i64,
    pub record: ItemRecord,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted location
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Created from an availability observation, carries no details beyond its id
    pub placeholder: bool,
}

/// Name given to a location known only by its identifier
pub fn placeholder_location_name(external_id: &str) -> String {
    format!("Location {}", external_id)
}

/// A persisted availability pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRow {
    pub id: i64,
    pub item_id: i64,
    pub location_id: i64,
    pub quantity: i64,
    pub last_checked: String,
}

/// Represents a pipeline run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub totals: RunTotals,
}

/// Item counts recorded when a run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_location_name("217"), "Location 217");
    }
}

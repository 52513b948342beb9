//! Persistence gateway trait and error types

use crate::catalog::ItemRecord;
use crate::storage::{AvailabilityRow, ItemRow, LocationRow, RunRecord, RunStatus, RunTotals};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Connection already closed")]
    Closed,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Everything the pipeline needs from the relational store
///
/// The pipeline is the only writer and calls these strictly one at a time.
pub trait Gateway {
    // ===== Items =====

    /// Looks an item up by the catalog's identifier
    fn find_item_by_external_id(&self, external_id: &str) -> StorageResult<Option<ItemRow>>;

    /// Inserts a new item
    fn insert_item(&mut self, item: &ItemRecord) -> StorageResult<ItemRow>;

    /// Overwrites every attribute of an existing item
    fn replace_item(&mut self, id: i64, item: &ItemRecord) -> StorageResult<ItemRow>;

    // ===== Locations =====

    /// Looks a location up by the catalog's identifier
    fn find_location_by_external_id(&self, external_id: &str)
        -> StorageResult<Option<LocationRow>>;

    /// Creates a location with only its identifier and a derived name
    fn create_location_placeholder(&mut self, external_id: &str) -> StorageResult<LocationRow>;

    // ===== Availability =====

    /// Inserts or updates the (item, location) row in a single conflict-resolving write
    fn upsert_availability(
        &mut self,
        item_id: i64,
        location_id: i64,
        quantity: i64,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Gets the availability row for a pair
    fn find_availability(
        &self,
        item_id: i64,
        location_id: i64,
    ) -> StorageResult<Option<AvailabilityRow>>;

    // ===== Run Ledger =====

    /// Records the start of a pipeline run
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records how a pipeline run ended
    fn finish_run(&mut self, run_id: i64, status: RunStatus, totals: &RunTotals)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    fn count_items(&self) -> StorageResult<u64>;

    fn count_locations(&self) -> StorageResult<u64>;

    /// Locations that still carry only their placeholder details
    fn count_placeholder_locations(&self) -> StorageResult<u64>;

    fn count_availability(&self) -> StorageResult<u64>;

    // ===== Lifecycle =====

    /// Releases the connection. Later calls fail with `StorageError::Closed`;
    /// closing again is a no-op.
    fn close_all(&mut self) -> StorageResult<()>;
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Gateway trait.

use crate::catalog::ItemRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Gateway, StorageError, StorageResult};
use crate::storage::{
    placeholder_location_name, AvailabilityRow, ItemRow, LocationRow, RunRecord, RunStatus,
    RunTotals,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

const ITEM_COLUMNS: &str = "id, external_id, name, category, sub_category, producer, country, \
     region, varietal, vintage, alcohol_content, sugar_content, volume_ml, price_cents, \
     description, image_url, source_url, created_at, updated_at";

const LOCATION_COLUMNS: &str = "id, external_id, name, address, city, province, postal_code, \
     phone, latitude, longitude, placeholder";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, total_items, \
     succeeded_items, failed_items";

/// SQLite storage backend
pub struct SqliteGateway {
    conn: Option<Connection>,
}

impl SqliteGateway {
    /// Creates a new SqliteGateway instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteGateway)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn: Some(conn) })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> StorageResult<&Connection> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }

    fn get_item(&self, id: i64) -> StorageResult<ItemRow> {
        let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
        self.conn()?
            .query_row(&sql, params![id], item_from_row)
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("item {}", id)))
    }

    fn get_location(&self, id: i64) -> StorageResult<LocationRow> {
        let sql = format!("SELECT {} FROM locations WHERE id = ?1", LOCATION_COLUMNS);
        self.conn()?
            .query_row(&sql, params![id], location_from_row)
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("location {}", id)))
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    let alcohol: Option<String> = row.get(10)?;
    Ok(ItemRow {
        id: row.get(0)?,
        record: ItemRecord {
            external_id: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            sub_category: row.get(4)?,
            producer: row.get(5)?,
            country: row.get(6)?,
            region: row.get(7)?,
            varietal: row.get(8)?,
            vintage: row.get(9)?,
            alcohol_content: alcohol.and_then(|value| Decimal::from_str(&value).ok()),
            sugar_content: row.get(11)?,
            volume_ml: row.get(12)?,
            price_cents: row.get(13)?,
            description: row.get(14)?,
            image_url: row.get(15)?,
            source_url: row.get(16)?,
        },
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        province: row.get(5)?,
        postal_code: row.get(6)?,
        phone: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        placeholder: row.get(10)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        totals: RunTotals {
            total: row.get::<_, i64>(5)? as u64,
            succeeded: row.get::<_, i64>(6)? as u64,
            failed: row.get::<_, i64>(7)? as u64,
        },
    })
}

impl Gateway for SqliteGateway {
    // ===== Items =====

    fn find_item_by_external_id(&self, external_id: &str) -> StorageResult<Option<ItemRow>> {
        let sql = format!("SELECT {} FROM items WHERE external_id = ?1", ITEM_COLUMNS);
        let item = self
            .conn()?
            .query_row(&sql, params![external_id], item_from_row)
            .optional()?;
        Ok(item)
    }

    fn insert_item(&mut self, item: &ItemRecord) -> StorageResult<ItemRow> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO items (external_id, name, category, sub_category, producer, country,
                 region, varietal, vintage, alcohol_content, sugar_content, volume_ml,
                 price_cents, description, image_url, source_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
            params![
                item.external_id,
                item.name,
                item.category,
                item.sub_category,
                item.producer,
                item.country,
                item.region,
                item.varietal,
                item.vintage,
                item.alcohol_content.map(|d| d.to_string()),
                item.sugar_content,
                item.volume_ml,
                item.price_cents,
                item.description,
                item.image_url,
                item.source_url,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.get_item(id)
    }

    fn replace_item(&mut self, id: i64, item: &ItemRecord) -> StorageResult<ItemRow> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn()?.execute(
            "UPDATE items SET external_id = ?1, name = ?2, category = ?3, sub_category = ?4,
                 producer = ?5, country = ?6, region = ?7, varietal = ?8, vintage = ?9,
                 alcohol_content = ?10, sugar_content = ?11, volume_ml = ?12, price_cents = ?13,
                 description = ?14, image_url = ?15, source_url = ?16, updated_at = ?17
             WHERE id = ?18",
            params![
                item.external_id,
                item.name,
                item.category,
                item.sub_category,
                item.producer,
                item.country,
                item.region,
                item.varietal,
                item.vintage,
                item.alcohol_content.map(|d| d.to_string()),
                item.sugar_content,
                item.volume_ml,
                item.price_cents,
                item.description,
                item.image_url,
                item.source_url,
                now,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("item {}", id)));
        }
        self.get_item(id)
    }

    // ===== Locations =====

    fn find_location_by_external_id(
        &self,
        external_id: &str,
    ) -> StorageResult<Option<LocationRow>> {
        let sql = format!(
            "SELECT {} FROM locations WHERE external_id = ?1",
            LOCATION_COLUMNS
        );
        let location = self
            .conn()?
            .query_row(&sql, params![external_id], location_from_row)
            .optional()?;
        Ok(location)
    }

    fn create_location_placeholder(&mut self, external_id: &str) -> StorageResult<LocationRow> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO locations (external_id, name, placeholder, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?3)",
            params![external_id, placeholder_location_name(external_id), now],
        )?;
        let id = conn.last_insert_rowid();
        self.get_location(id)
    }

    // ===== Availability =====

    fn upsert_availability(
        &mut self,
        item_id: i64,
        location_id: i64,
        quantity: i64,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let checked = checked_at.to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO availability (item_id, location_id, quantity, last_checked, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4, ?4)
             ON CONFLICT(item_id, location_id) DO UPDATE SET
                 quantity = excluded.quantity,
                 last_checked = excluded.last_checked,
                 updated_at = excluded.updated_at",
            params![item_id, location_id, quantity, checked],
        )?;
        Ok(())
    }

    fn find_availability(
        &self,
        item_id: i64,
        location_id: i64,
    ) -> StorageResult<Option<AvailabilityRow>> {
        let row = self
            .conn()?
            .query_row(
                "SELECT id, item_id, location_id, quantity, last_checked FROM availability
                 WHERE item_id = ?1 AND location_id = ?2",
                params![item_id, location_id],
                |row| {
                    Ok(AvailabilityRow {
                        id: row.get(0)?,
                        item_id: row.get(1)?,
                        location_id: row.get(2)?,
                        quantity: row.get(3)?,
                        last_checked: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ===== Run Ledger =====

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sync_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        totals: &RunTotals,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "UPDATE sync_runs SET status = ?1, finished_at = ?2, total_items = ?3,
                 succeeded_items = ?4, failed_items = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                totals.total as i64,
                totals.succeeded as i64,
                totals.failed as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM sync_runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        );
        let run = self.conn()?.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    // ===== Statistics =====

    fn count_items(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_locations(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_placeholder_locations(&self) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM locations WHERE placeholder = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_availability(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM availability", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Lifecycle =====

    fn close_all(&mut self) -> StorageResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
            tracing::debug!("Database connection closed");
        }
        Ok(())
    }
}

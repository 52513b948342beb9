//! Item and availability synchronization
//!
//! Writes are last-observed-wins: a fresh observation overwrites whatever the
//! store holds for the same key.

use crate::catalog::{AvailabilityObservation, ItemRecord};
use crate::storage::{Gateway, ItemRow, LocationRow, StorageResult};
use chrono::{DateTime, Utc};

/// Outcome of syncing one item's availability list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub synced: u64,
    pub failed: u64,
}

/// Applies extracted records to a [`Gateway`]
///
/// Assumes it is the only writer; item upserts are a lookup followed by a write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOrchestrator;

impl SyncOrchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Inserts the item, or fully replaces the row with the same external id
    pub fn sync_item<G>(&self, gateway: &mut G, record: &ItemRecord) -> StorageResult<ItemRow>
    where
        G: Gateway + ?Sized,
    {
        match gateway.find_item_by_external_id(&record.external_id)? {
            Some(existing) => {
                let row = gateway.replace_item(existing.id, record)?;
                tracing::debug!("Updated item {} (id {})", record.external_id, row.id);
                Ok(row)
            }
            None => {
                let row = gateway.insert_item(record)?;
                tracing::debug!("Created item {} (id {})", record.external_id, row.id);
                Ok(row)
            }
        }
    }

    /// Writes every observation for the item with internal id `item_id`
    ///
    /// Never fails as a whole: each observation that cannot be written is
    /// logged and counted in [`AvailabilityReport::failed`].
    pub fn sync_availability<G>(
        &self,
        gateway: &mut G,
        item_id: i64,
        observations: &[AvailabilityObservation],
    ) -> AvailabilityReport
    where
        G: Gateway + ?Sized,
    {
        self.sync_availability_at(gateway, item_id, observations, Utc::now())
    }

    /// Like [`sync_availability`](Self::sync_availability) with an explicit check time
    pub fn sync_availability_at<G>(
        &self,
        gateway: &mut G,
        item_id: i64,
        observations: &[AvailabilityObservation],
        checked_at: DateTime<Utc>,
    ) -> AvailabilityReport
    where
        G: Gateway + ?Sized,
    {
        let mut report = AvailabilityReport::default();

        for observation in observations {
            let written = find_or_create_location(gateway, &observation.location_external_id)
                .and_then(|location| {
                    gateway.upsert_availability(
                        item_id,
                        location.id,
                        observation.quantity,
                        checked_at,
                    )
                });

            match written {
                Ok(()) => report.synced += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to sync availability of item {} at location {}: {}",
                        observation.item_external_id,
                        observation.location_external_id,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Looks the location up, creating a placeholder when it is not yet known
pub fn find_or_create_location<G>(gateway: &mut G, external_id: &str) -> StorageResult<LocationRow>
where
    G: Gateway + ?Sized,
{
    if let Some(location) = gateway.find_location_by_external_id(external_id)? {
        return Ok(location);
    }

    let location = gateway.create_location_placeholder(external_id)?;
    tracing::debug!("Created placeholder location {}", external_id);
    Ok(location)
}

//! Item page extraction
//!
//! `parse_item` and `parse_availability` are pure functions of a rendered
//! [`Document`]; `ItemExtractor` drives the page into the right state first.

use crate::catalog::fields::{
    external_id_from_url, parse_decimal, parse_quantity, parse_whole_number,
};
use crate::catalog::{AvailabilityObservation, ItemRecord};
use crate::config::{Config, SelectorProfile};
use crate::render::{evaluate, wait_for, Document, PageDriver, WaitCondition};
use crate::{CatalogError, ExtractionIncomplete, RenderError};
use std::time::Duration;

/// Builds an item record from a rendered item page
///
/// # Errors
///
/// Returns `ExtractionIncomplete` when the external id (from `url`) or the
/// display name cannot be found; partial records are never produced.
pub fn parse_item(
    doc: &dyn Document,
    url: &str,
    selectors: &SelectorProfile,
    marker: &str,
) -> Result<ItemRecord, ExtractionIncomplete> {
    let external_id = external_id_from_url(url, marker);
    if external_id.is_empty() {
        return Err(ExtractionIncomplete {
            url: url.to_string(),
            missing: "external id",
        });
    }

    let name = doc.text(&selectors.name).ok_or_else(|| ExtractionIncomplete {
        url: url.to_string(),
        missing: "name",
    })?;

    Ok(ItemRecord {
        external_id,
        name,
        category: doc.text(&selectors.category),
        sub_category: doc.text(&selectors.sub_category),
        producer: doc.text(&selectors.producer),
        country: doc.text(&selectors.country),
        region: doc.text(&selectors.region),
        varietal: doc.text(&selectors.varietal),
        vintage: doc.text(&selectors.vintage),
        alcohol_content: parse_decimal(doc.text(&selectors.alcohol).as_deref()),
        sugar_content: doc.text(&selectors.sugar),
        volume_ml: parse_whole_number(doc.text(&selectors.volume).as_deref()),
        price_cents: parse_whole_number(doc.text(&selectors.price).as_deref()),
        description: doc.text(&selectors.description),
        image_url: doc.attr(&selectors.image, "src"),
        source_url: url.to_string(),
    })
}

/// Reads every location entry from a page's availability list
///
/// The item id comes from the page URL. Entries without a location id, or on a
/// page whose URL carries no item id, are dropped.
pub fn parse_availability(
    doc: &dyn Document,
    page_url: &str,
    selectors: &SelectorProfile,
    marker: &str,
) -> Vec<AvailabilityObservation> {
    let item_external_id = external_id_from_url(page_url, marker);
    if item_external_id.is_empty() {
        return Vec::new();
    }

    doc.each(&selectors.availability_entry)
        .into_iter()
        .filter_map(|entry| {
            let location_external_id = entry.own_attr(&selectors.location_id_attr)?;
            let quantity = parse_quantity(entry.text(&selectors.quantity).as_deref());
            Some(AvailabilityObservation {
                item_external_id: item_external_id.clone(),
                location_external_id,
                quantity,
            })
        })
        .collect()
}

/// Loads item pages and runs the extraction functions against them
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    selectors: SelectorProfile,
    marker: String,
    navigation_timeout: Duration,
    item_timeout: Duration,
    availability_timeout: Duration,
    reveal_settle: Duration,
}

impl ItemExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            selectors: config.selectors.clone(),
            marker: config.catalog.item_path_marker.clone(),
            navigation_timeout: config.timing.navigation_timeout(),
            item_timeout: config.timing.item_timeout(),
            availability_timeout: config.timing.availability_timeout(),
            reveal_settle: config.timing.reveal_settle(),
        }
    }

    /// Navigates to `url` and extracts its item record
    pub async fn extract_item<D>(&self, driver: &mut D, url: &str) -> Result<ItemRecord, CatalogError>
    where
        D: PageDriver + ?Sized,
    {
        tracing::debug!("Extracting item: {}", url);

        driver.navigate(url, self.navigation_timeout).await?;
        let ready = WaitCondition::Present(self.selectors.item_ready.clone());
        wait_for(driver, &ready, self.item_timeout).await?;

        let record = evaluate(driver, |doc| {
            parse_item(doc, url, &self.selectors, &self.marker)
        })
        .await??;

        tracing::debug!("Extracted item {}: {}", record.external_id, record.name);
        Ok(record)
    }

    /// Reveals and reads the per-location availability list of the item at `url`
    ///
    /// A page without an availability control, a reveal action that fails, or a
    /// list that never appears is reported as having no availability rather than
    /// as a failure. Only navigation and page reads propagate errors.
    pub async fn extract_availability<D>(
        &self,
        driver: &mut D,
        url: &str,
    ) -> Result<Vec<AvailabilityObservation>, RenderError>
    where
        D: PageDriver + ?Sized,
    {
        if driver.current_url() != Some(url) {
            driver.navigate(url, self.navigation_timeout).await?;
        }

        let revealed = match driver.interact(&self.selectors.reveal_availability).await {
            Ok(revealed) => revealed,
            Err(e) => {
                tracing::warn!("Could not reveal availability for {}: {}", url, e);
                return Ok(Vec::new());
            }
        };

        if revealed {
            tokio::time::sleep(self.reveal_settle).await;

            let listed = WaitCondition::Present(self.selectors.availability_entry.clone());
            if let Err(e) = wait_for(driver, &listed, self.availability_timeout).await {
                tracing::warn!("Availability list never appeared for {}: {}", url, e);
                return Ok(Vec::new());
            }
        }

        let entries = evaluate(driver, |doc| {
            let page_url = if doc.url().is_empty() { url } else { doc.url() };
            parse_availability(doc, page_url, &self.selectors, &self.marker)
        })
        .await?;

        if !revealed && entries.is_empty() {
            tracing::warn!("No availability control found for {}", url);
        }

        Ok(entries)
    }
}

//! Catalog module: finding items and reading them
//!
//! This module contains the source-facing half of the pipeline:
//! - Discovering every item URL on an infinite-scroll listing
//! - Extracting item attributes from a rendered item page
//! - Extracting per-location availability from an item page
//! - Parsing raw field text into typed values

mod discoverer;
mod extractor;
pub mod fields;

pub use discoverer::{dedupe_item_urls, CatalogDiscoverer};
pub use extractor::{parse_availability, parse_item, ItemExtractor};

use rust_decimal::Decimal;

/// Attributes of one catalog item as observed on its page
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub external_id: String,
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub producer: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub varietal: Option<String>,
    pub vintage: Option<String>,
    pub alcohol_content: Option<Decimal>,
    pub sugar_content: Option<String>,
    pub volume_ml: Option<i64>,
    /// Digits of the displayed price, e.g. `"$24.95"` is `2495`
    pub price_cents: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: String,
}

impl ItemRecord {
    /// A record with only its identity fields set
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            category: None,
            sub_category: None,
            producer: None,
            country: None,
            region: None,
            varietal: None,
            vintage: None,
            alcohol_content: None,
            sugar_content: None,
            volume_ml: None,
            price_cents: None,
            description: None,
            image_url: None,
            source_url: source_url.into(),
        }
    }
}

/// One location's stock of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityObservation {
    pub item_external_id: String,
    pub location_external_id: String,
    pub quantity: i64,
}

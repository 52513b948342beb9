use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for catalog-sync
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub selectors: SelectorProfile,
}

/// Where the catalog lives and how item links are recognised
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Entry point of the dynamic listing
    #[serde(rename = "listing-url", default = "default_listing_url")]
    pub listing_url: String,

    /// Path fragment every item URL contains; the external id follows it
    #[serde(rename = "item-path-marker", default = "default_item_path_marker")]
    pub item_path_marker: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            item_path_marker: default_item_path_marker(),
        }
    }
}

fn default_listing_url() -> String {
    "https://www.lcbo.com/en/catalogsearch/result/#q=&t=Products".to_string()
}

fn default_item_path_marker() -> String {
    "/product/".to_string()
}

/// Delays, timeouts and thresholds. All durations are milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TimingConfig {
    /// Minimum spacing between item-processing cycles
    pub delay_ms: u64,

    pub navigation_timeout_ms: u64,

    /// Bound on the wait for the listing's first item link
    pub first_render_timeout_ms: u64,

    /// Pause after listing navigation before the first-render wait begins
    pub render_grace_ms: u64,

    /// Time given to asynchronous content after each scroll
    pub settle_interval_ms: u64,

    /// Consecutive unchanged height reads that end discovery
    pub stability_threshold: u32,

    /// Upper bound on the whole scroll phase
    pub discovery_timeout_ms: u64,

    /// Bound on the wait for an item page's detail container
    pub item_timeout_ms: u64,

    /// Bound on the wait for the availability list after the reveal action
    pub availability_timeout_ms: u64,

    /// Pause after the reveal action
    pub reveal_settle_ms: u64,

    /// Log a progress snapshot every N successful items
    pub progress_interval: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            navigation_timeout_ms: 60_000,
            first_render_timeout_ms: 45_000,
            render_grace_ms: 3_000,
            settle_interval_ms: 3_000,
            stability_threshold: 3,
            discovery_timeout_ms: 30 * 60 * 1_000,
            item_timeout_ms: 30_000,
            availability_timeout_ms: 30_000,
            reveal_settle_ms: 2_000,
            progress_interval: 10,
        }
    }
}

impl TimingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn first_render_timeout(&self) -> Duration {
        Duration::from_millis(self.first_render_timeout_ms)
    }

    pub fn render_grace(&self) -> Duration {
        Duration::from_millis(self.render_grace_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.availability_timeout_ms)
    }

    pub fn reveal_settle(&self) -> Duration {
        Duration::from_millis(self.reveal_settle_ms)
    }
}

/// Rendering session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserConfig {
    pub headless: bool,

    /// Client identification sent with every request
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Persistence connection parameters
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "./catalog.db".to_string()
}

/// CSS selectors describing one catalog's markup
///
/// The defaults match the catalog the tool was first written against.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorProfile {
    /// Anchors on the listing page that may point at items
    pub listing_link: String,
    /// Container present once an item page has rendered
    pub item_ready: String,
    pub name: String,
    pub category: String,
    pub sub_category: String,
    pub producer: String,
    pub country: String,
    pub region: String,
    pub varietal: String,
    pub vintage: String,
    pub alcohol: String,
    pub sugar: String,
    pub volume: String,
    pub price: String,
    pub description: String,
    pub image: String,
    /// Control that reveals the per-location availability list
    pub reveal_availability: String,
    /// One element per location in the availability list
    pub availability_entry: String,
    /// Attribute on an availability entry holding the location id
    pub location_id_attr: String,
    /// Quantity text inside an availability entry
    pub quantity: String,
}

impl Default for SelectorProfile {
    fn default() -> Self {
        Self {
            listing_link: ".img-products a[href]".to_string(),
            item_ready: ".product-view".to_string(),
            name: ".product-name".to_string(),
            category: ".category-name".to_string(),
            sub_category: "[data-field=\"sub-category\"]".to_string(),
            producer: ".producer-name".to_string(),
            country: "[data-field=\"country\"]".to_string(),
            region: "[data-field=\"region\"]".to_string(),
            varietal: "[data-field=\"varietal\"]".to_string(),
            vintage: "[data-field=\"vintage\"]".to_string(),
            alcohol: "[data-field=\"alcohol\"]".to_string(),
            sugar: "[data-field=\"sugar\"]".to_string(),
            volume: "[data-field=\"volume\"]".to_string(),
            price: ".price".to_string(),
            description: ".product-description".to_string(),
            image: ".product-image img".to_string(),
            reveal_availability: "button.check-availability, a.see-all-stores".to_string(),
            availability_entry: ".store-item, .store-location".to_string(),
            location_id_attr: "data-store-id".to_string(),
            quantity: ".quantity, .stock-level".to_string(),
        }
    }
}

use crate::config::types::{CatalogConfig, Config, SelectorProfile, TimingConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_timing_config(&config.timing)?;
    validate_database_path(&config.database.path)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates catalog location settings
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "listing-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.item_path_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "item-path-marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates timing settings
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.stability_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stability-threshold must be >= 1, got {}",
            config.stability_threshold
        )));
    }

    if config.settle_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "settle-interval-ms must be greater than zero".to_string(),
        ));
    }

    // Every driver call must be boundable
    for (name, value) in [
        ("navigation-timeout-ms", config.navigation_timeout_ms),
        ("first-render-timeout-ms", config.first_render_timeout_ms),
        ("discovery-timeout-ms", config.discovery_timeout_ms),
        ("item-timeout-ms", config.item_timeout_ms),
        ("availability-timeout-ms", config.availability_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                name
            )));
        }
    }

    if config.discovery_timeout_ms < config.settle_interval_ms {
        return Err(ConfigError::Validation(format!(
            "discovery-timeout-ms ({}) must be at least settle-interval-ms ({})",
            config.discovery_timeout_ms, config.settle_interval_ms
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_database_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Checks that every selector in the profile parses
fn validate_selectors(profile: &SelectorProfile) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("listing-link", &profile.listing_link),
        ("item-ready", &profile.item_ready),
        ("name", &profile.name),
        ("category", &profile.category),
        ("sub-category", &profile.sub_category),
        ("producer", &profile.producer),
        ("country", &profile.country),
        ("region", &profile.region),
        ("varietal", &profile.varietal),
        ("vintage", &profile.vintage),
        ("alcohol", &profile.alcohol),
        ("sugar", &profile.sugar),
        ("volume", &profile.volume),
        ("price", &profile.price),
        ("description", &profile.description),
        ("image", &profile.image),
        ("reveal-availability", &profile.reveal_availability),
        ("availability-entry", &profile.availability_entry),
        ("quantity", &profile.quantity),
    ] {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' is not valid CSS: '{}'",
                name, selector
            )));
        }
    }

    if profile.location_id_attr.is_empty() {
        return Err(ConfigError::Validation(
            "location-id-attr cannot be empty".to_string(),
        ));
    }

    Ok(())
}

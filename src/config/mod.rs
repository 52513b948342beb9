//! Configuration module for catalog-sync
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and applying the environment-style overrides the pipeline honours.
//!
//! # Example
//!
//! ```no_run
//! use catalog_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("catalog.toml")).unwrap();
//! println!("Listing: {}", config.catalog.listing_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CatalogConfig, Config, DatabaseConfig, SelectorProfile, TimingConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, default_config, fold_overrides_into_hash, load_config,
    load_config_with_hash,
};

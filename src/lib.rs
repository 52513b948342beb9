//! catalog-sync: catalog discovery and availability synchronization
//!
//! This crate discovers every item in an infinite-scroll catalog, extracts
//! per-item attributes and per-location availability, and reconciles them
//! into a relational store with idempotent upserts.

pub mod catalog;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod storage;
pub mod sync;

use std::time::Duration;
use thiserror::Error;

/// Main error type for catalog-sync operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Extraction(#[from] ExtractionIncomplete),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to initialize rendering layer: {0}")]
    Init(String),

    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Timed out after {timeout:?} waiting for {condition}")]
    WaitTimeout { condition: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Rendering session is not open")]
    Closed,
}

/// Errors that abort catalog discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Listing at {url} never rendered an item link: {source}")]
    NeverRendered { url: String, source: RenderError },

    #[error("Listing height never stabilized within {elapsed:?}")]
    NeverStabilized { elapsed: Duration },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// An item page was missing one of its identity fields
#[derive(Debug, Error)]
#[error("Item at {url} is missing its {missing}")]
pub struct ExtractionIncomplete {
    pub url: String,
    pub missing: &'static str,
}

/// Result type alias for catalog-sync operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{Pipeline, RunSummary};
pub use render::PageDriver;
pub use storage::{Gateway, SqliteGateway};

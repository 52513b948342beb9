//! catalog-sync main entry point
//!
//! This is the command-line interface for the catalog synchronizer.

use anyhow::Context;
use catalog_sync::config::{load_config_with_hash, Config};
use catalog_sync::output::{load_statistics, print_run_summary, print_statistics};
use catalog_sync::pipeline::{MinIntervalGate, Pipeline};
use catalog_sync::storage::open_gateway;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// catalog-sync: keeps a local database in step with an online catalog
///
/// Discovers every item on the catalog listing, extracts item attributes and
/// per-location availability, and upserts them into SQLite.
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(version = "1.0.0")]
#[command(about = "Catalog discovery and availability synchronizer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus environment when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the resolved settings without syncing
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) = load_config_with_hash(cli.config.as_deref())
        .context("Failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_sync(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sync=info,warn"),
            1 => EnvFilter::new("catalog_sync=debug,info"),
            2 => EnvFilter::new("catalog_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== catalog-sync Dry Run ===\n");

    println!("Catalog:");
    println!("  Listing URL: {}", config.catalog.listing_url);
    println!("  Item path marker: {}", config.catalog.item_path_marker);

    let timing = &config.timing;
    println!("\nTiming:");
    println!("  Delay between items: {}ms", timing.delay_ms);
    println!("  Navigation timeout: {}ms", timing.navigation_timeout_ms);
    println!("  First render timeout: {}ms", timing.first_render_timeout_ms);
    println!(
        "  Settle interval: {}ms x {} stable reads",
        timing.settle_interval_ms, timing.stability_threshold
    );
    println!("  Discovery timeout: {}ms", timing.discovery_timeout_ms);
    println!("  Item timeout: {}ms", timing.item_timeout_ms);
    println!("  Availability timeout: {}ms", timing.availability_timeout_ms);
    println!("  Progress every {} items", timing.progress_interval);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!("  User agent: {}", config.browser.user_agent);
    println!("  Driver: {}", driver_name());

    println!("\nDatabase:");
    println!("  Path: {}", config.database.path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.database.path);

    let gateway = open_gateway(Path::new(&config.database.path))
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let stats = load_statistics(&gateway)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main sync operation
async fn handle_sync(config: Config, config_hash: String) -> anyhow::Result<()> {
    let gateway = open_gateway(Path::new(&config.database.path))
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let limiter = MinIntervalGate::new(config.timing.delay());

    tracing::info!(
        "Syncing {} into {} with the {} driver",
        config.catalog.listing_url,
        config.database.path,
        driver_name()
    );

    let mut pipeline = Pipeline::new(&config, build_driver(&config), gateway, limiter)
        .with_config_hash(config_hash);

    match pipeline.run().await {
        Ok(summary) => {
            tracing::info!("Sync completed successfully");
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(feature = "chrome")]
fn build_driver(config: &Config) -> catalog_sync::render::ChromeDriver {
    catalog_sync::render::ChromeDriver::new(config.browser.headless, &config.browser.user_agent)
}

#[cfg(not(feature = "chrome"))]
fn build_driver(config: &Config) -> catalog_sync::render::HttpDriver {
    catalog_sync::render::HttpDriver::new(&config.browser.user_agent)
}

fn driver_name() -> &'static str {
    if cfg!(feature = "chrome") {
        "chromium"
    } else {
        "http"
    }
}

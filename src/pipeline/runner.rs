//! The discovery and synchronization run
//!
//! A run moves through `Idle -> Discovering -> Processing -> Draining -> Done`.
//! Only a failed session start or a failed discovery aborts it; every other
//! error is confined to the item it happened on.

use crate::catalog::{CatalogDiscoverer, ItemExtractor};
use crate::config::Config;
use crate::pipeline::progress::{Outcome, ProgressTracker};
use crate::pipeline::rate_limit::RateLimiter;
use crate::pipeline::{PipelineState, RunSummary};
use crate::render::PageDriver;
use crate::storage::{Gateway, RunStatus, RunTotals};
use crate::sync::{AvailabilityReport, SyncOrchestrator};
use crate::CatalogError;

/// Owns the rendering session and the store for one run
pub struct Pipeline<D, G, R> {
    driver: D,
    gateway: G,
    limiter: R,
    discoverer: CatalogDiscoverer,
    extractor: ItemExtractor,
    sync: SyncOrchestrator,
    progress: ProgressTracker,
    availability: AvailabilityReport,
    state: PipelineState,
    config_hash: String,
    progress_interval: u64,
}

impl<D, G, R> Pipeline<D, G, R>
where
    D: PageDriver,
    G: Gateway,
    R: RateLimiter,
{
    /// Creates a new pipeline
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved configuration
    /// * `driver` - Rendering session, not yet initialized
    /// * `gateway` - Open store
    /// * `limiter` - Pacing between item cycles
    pub fn new(config: &Config, driver: D, gateway: G, limiter: R) -> Self {
        Self {
            driver,
            gateway,
            limiter,
            discoverer: CatalogDiscoverer::new(config),
            extractor: ItemExtractor::new(config),
            sync: SyncOrchestrator::new(),
            progress: ProgressTracker::new(),
            availability: AvailabilityReport::default(),
            state: PipelineState::Idle,
            config_hash: "defaults".to_string(),
            progress_interval: config.timing.progress_interval.max(1),
        }
    }

    /// Sets the configuration hash recorded in the run ledger
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs discovery, then every item in discovery order, then drains
    ///
    /// Draining releases the session and the store whether or not the run
    /// succeeded.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Discovery completed; individual items may still have failed
    /// * `Err(CatalogError)` - Session start or discovery failed
    pub async fn run(&mut self) -> Result<RunSummary, CatalogError> {
        self.progress = ProgressTracker::new();
        self.availability = AvailabilityReport::default();

        let run_id = match self.gateway.begin_run(&self.config_hash) {
            Ok(id) => {
                tracing::info!("Starting sync run {}", id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Could not record run start: {}", e);
                None
            }
        };

        let result = self.execute().await;
        self.drain(run_id, result.is_ok()).await;

        result.map(|()| RunSummary {
            progress: self.progress.snapshot(),
            availability: self.availability,
        })
    }

    async fn execute(&mut self) -> Result<(), CatalogError> {
        self.driver.init().await?;

        self.state = PipelineState::Discovering;
        let urls = self.discoverer.discover_all(&mut self.driver).await?;

        self.state = PipelineState::Processing;
        self.progress.set_total(urls.len() as u64);
        tracing::info!("Processing {} items", urls.len());

        for url in &urls {
            self.limiter.acquire().await;

            match self.process_item(url).await {
                Ok(report) => {
                    self.progress.record(Outcome::Succeeded);
                    self.availability.synced += report.synced;
                    self.availability.failed += report.failed;

                    if self.progress.succeeded() % self.progress_interval == 0 {
                        tracing::info!("Progress: {}", self.progress.snapshot());
                    }
                }
                Err(e) => {
                    tracing::error!("Error processing {}: {}", url, e);
                    self.progress.record(Outcome::Failed);
                }
            }
        }

        Ok(())
    }

    /// Extracts and stores one item and its availability
    async fn process_item(&mut self, url: &str) -> Result<AvailabilityReport, CatalogError> {
        let record = self.extractor.extract_item(&mut self.driver, url).await?;
        let row = self.sync.sync_item(&mut self.gateway, &record)?;

        let observations = self
            .extractor
            .extract_availability(&mut self.driver, url)
            .await?;
        let report = self
            .sync
            .sync_availability(&mut self.gateway, row.id, &observations);

        if report.failed > 0 {
            tracing::warn!(
                "Item {}: {} of {} availability entries failed to sync",
                record.external_id,
                report.failed,
                observations.len()
            );
        }
        tracing::debug!(
            "Synced item {} with {} locations",
            record.external_id,
            report.synced
        );

        Ok(report)
    }

    async fn drain(&mut self, run_id: Option<i64>, succeeded: bool) {
        self.state = PipelineState::Draining;

        let snapshot = self.progress.snapshot();
        tracing::info!("Run finished: {} in {:?}", snapshot, snapshot.elapsed);

        if let Err(e) = self.driver.close().await {
            tracing::warn!("Failed to close rendering session: {}", e);
        }

        if let Some(run_id) = run_id {
            let status = if succeeded {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            };
            let totals = RunTotals {
                total: snapshot.total,
                succeeded: snapshot.succeeded,
                failed: snapshot.failed,
            };
            if let Err(e) = self.gateway.finish_run(run_id, status, &totals) {
                tracing::warn!("Could not record run end: {}", e);
            }
        }

        if let Err(e) = self.gateway.close_all() {
            tracing::warn!("Failed to close database: {}", e);
        }

        self.state = PipelineState::Done;
    }
}

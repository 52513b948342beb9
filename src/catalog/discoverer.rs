//! Infinite-scroll catalog discovery
//!
//! The listing has no total count, so discovery keeps asking for more content
//! until the page height stops changing for a number of consecutive reads.

use crate::catalog::fields::is_item_url;
use crate::config::Config;
use crate::render::{evaluate, wait_for, Document, PageDriver, WaitCondition};
use crate::DiscoveryError;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Enumerates every item URL on the catalog listing
#[derive(Debug, Clone)]
pub struct CatalogDiscoverer {
    listing_url: String,
    item_marker: String,
    link_selector: String,
    navigation_timeout: Duration,
    first_render_timeout: Duration,
    render_grace: Duration,
    settle_interval: Duration,
    stability_threshold: u32,
    discovery_timeout: Duration,
}

impl CatalogDiscoverer {
    pub fn new(config: &Config) -> Self {
        Self {
            listing_url: config.catalog.listing_url.clone(),
            item_marker: config.catalog.item_path_marker.clone(),
            link_selector: config.selectors.listing_link.clone(),
            navigation_timeout: config.timing.navigation_timeout(),
            first_render_timeout: config.timing.first_render_timeout(),
            render_grace: config.timing.render_grace(),
            settle_interval: config.timing.settle_interval(),
            stability_threshold: config.timing.stability_threshold,
            discovery_timeout: config.timing.discovery_timeout(),
        }
    }

    /// Returns every item URL on the listing, each exactly once, in page order
    ///
    /// # Errors
    ///
    /// * `DiscoveryError::NeverRendered` - the listing or its first item link never appeared
    /// * `DiscoveryError::NeverStabilized` - the page kept growing past the discovery timeout
    pub async fn discover_all<D>(&self, driver: &mut D) -> Result<Vec<String>, DiscoveryError>
    where
        D: PageDriver + ?Sized,
    {
        tracing::info!("Starting item discovery at {}", self.listing_url);

        let never_rendered = |source| DiscoveryError::NeverRendered {
            url: self.listing_url.clone(),
            source,
        };

        driver
            .navigate(&self.listing_url, self.navigation_timeout)
            .await
            .map_err(never_rendered)?;

        if !self.render_grace.is_zero() {
            tokio::time::sleep(self.render_grace).await;
        }

        let first_item = WaitCondition::LinkContaining {
            selector: self.link_selector.clone(),
            needle: self.item_marker.clone(),
        };
        wait_for(driver, &first_item, self.first_render_timeout)
            .await
            .map_err(never_rendered)?;

        tracing::info!("Items rendered, scrolling to load the full listing");
        let scrolls = self.scroll_until_stable(driver).await?;

        let (base, hrefs) = evaluate(driver, |doc| {
            (doc.url().to_string(), doc.attrs(&self.link_selector, "href"))
        })
        .await?;

        let found = hrefs.len();
        let urls = dedupe_item_urls(
            hrefs.into_iter().map(|href| resolve(&base, href)),
            &self.item_marker,
        );

        tracing::info!(
            "Discovery finished after {} scrolls: {} links, {} unique items",
            scrolls,
            found,
            urls.len()
        );
        Ok(urls)
    }

    /// Scrolls until the height is unchanged for `stability_threshold` reads in a row
    ///
    /// Returns the number of scrolls performed. The whole phase is bounded by the
    /// discovery timeout so an ever-growing page cannot hang the run.
    async fn scroll_until_stable<D>(&self, driver: &mut D) -> Result<u32, DiscoveryError>
    where
        D: PageDriver + ?Sized,
    {
        let started = Instant::now();
        match tokio::time::timeout(self.discovery_timeout, self.scroll_loop(driver)).await {
            Ok(result) => result,
            Err(_) => Err(DiscoveryError::NeverStabilized {
                elapsed: started.elapsed(),
            }),
        }
    }

    async fn scroll_loop<D>(&self, driver: &mut D) -> Result<u32, DiscoveryError>
    where
        D: PageDriver + ?Sized,
    {
        let mut current = driver.current_height().await?;
        let mut stable_reads = 0;
        let mut scrolls = 0;

        while stable_reads < self.stability_threshold {
            let previous = current;

            driver.trigger_more_content().await?;
            tokio::time::sleep(self.settle_interval).await;
            current = driver.current_height().await?;
            scrolls += 1;

            if current == previous {
                stable_reads += 1;
            } else {
                tracing::debug!("Listing grew from {} to {}", previous, current);
                stable_reads = 0;
            }
        }

        Ok(scrolls)
    }
}

/// Resolves `href` against the page it was found on, keeping it verbatim on failure
fn resolve(base: &str, href: String) -> String {
    match Url::parse(base).and_then(|base| base.join(&href)) {
        Ok(url) => url.to_string(),
        Err(_) => href,
    }
}

/// Keeps item URLs only, dropping exact duplicates while preserving first-seen order
pub fn dedupe_item_urls<I>(links: I, marker: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| is_item_url(link, marker))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

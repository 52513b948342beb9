//! Rendering layer
//!
//! This module defines the boundary between the pipeline and whatever renders
//! catalog pages:
//! - `PageDriver`: the async interface a rendering session implements
//! - `WaitCondition` / `wait_for`: bounded readiness polling on top of a driver
//! - `evaluate`: runs an extraction function against the current page
//! - `HttpDriver`: static-markup driver built on reqwest
//! - `ChromeDriver`: headless Chromium driver (`chrome` feature)

#[cfg(feature = "chrome")]
mod chrome;
pub mod document;
mod http;

#[cfg(feature = "chrome")]
pub use chrome::ChromeDriver;
pub use document::{Document, HtmlDocument};
pub use http::HttpDriver;

use crate::RenderError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How often `wait_for` re-reads the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A single rendering session
///
/// Every method either completes promptly or takes a caller-supplied timeout;
/// no call may block indefinitely.
#[async_trait]
pub trait PageDriver: Send {
    /// Starts the session. Failure here is fatal to a run.
    async fn init(&mut self) -> Result<(), RenderError>;

    /// Loads `url`, failing with `NavigationTimeout` after `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// URL of the page currently loaded, if any
    fn current_url(&self) -> Option<&str>;

    /// Current rendered markup
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Current rendered content height
    async fn current_height(&mut self) -> Result<u64, RenderError>;

    /// Asks the page for more content (scroll-to-bottom equivalent)
    async fn trigger_more_content(&mut self) -> Result<(), RenderError>;

    /// Clicks the first element matching `selector`
    ///
    /// Returns `Ok(false)` when nothing matches; a missing target is not an error.
    async fn interact(&mut self, selector: &str) -> Result<bool, RenderError>;

    /// Releases the session. Safe to call more than once.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// A readiness condition evaluated against rendered markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one element matches the selector
    Present(String),

    /// At least one element matching `selector` has an `href` containing `needle`
    LinkContaining { selector: String, needle: String },
}

impl WaitCondition {
    /// Checks the condition against a parsed page
    pub fn is_met(&self, document: &dyn Document) -> bool {
        match self {
            Self::Present(selector) => document.count(selector) > 0,
            Self::LinkContaining { selector, needle } => document
                .attrs(selector, "href")
                .iter()
                .any(|href| href.contains(needle.as_str())),
        }
    }

    fn is_met_in(&self, content: &str) -> bool {
        let document = HtmlDocument::parse("", content);
        self.is_met(&document)
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(selector) => write!(f, "'{}'", selector),
            Self::LinkContaining { selector, needle } => {
                write!(f, "'{}' linking to '{}'", selector, needle)
            }
        }
    }
}

/// Polls the page until `condition` holds, failing with `WaitTimeout` after `timeout`
pub async fn wait_for<D>(
    driver: &mut D,
    condition: &WaitCondition,
    timeout: Duration,
) -> Result<(), RenderError>
where
    D: PageDriver + ?Sized,
{
    match tokio::time::timeout(timeout, poll_until(driver, condition)).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::WaitTimeout {
            condition: condition.to_string(),
            timeout,
        }),
    }
}

async fn poll_until<D>(driver: &mut D, condition: &WaitCondition) -> Result<(), RenderError>
where
    D: PageDriver + ?Sized,
{
    loop {
        let content = driver.content().await?;
        if condition.is_met_in(&content) {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Runs an extraction function against the page currently loaded
pub async fn evaluate<D, F, T>(driver: &mut D, extract: F) -> Result<T, RenderError>
where
    D: PageDriver + ?Sized,
    F: FnOnce(&HtmlDocument) -> T,
{
    let content = driver.content().await?;
    let url = driver.current_url().unwrap_or_default();
    let document = HtmlDocument::parse(url, &content);
    Ok(extract(&document))
}

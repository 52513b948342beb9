//! Scripted page driver for pipeline tests

use async_trait::async_trait;
use catalog_sync::render::{Document, HtmlDocument, PageDriver};
use catalog_sync::RenderError;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// How the listing height evolves as more content is requested
pub enum Heights {
    /// Read in order; the last value repeats once exhausted
    Sequence(Vec<u64>),
    /// Grows on every read
    Unbounded,
}

pub struct FakeDriver {
    listing_url: String,
    listing_html: String,
    pages: HashMap<String, String>,
    unreachable: HashSet<String>,
    heights: Heights,
    fail_init: bool,
    interact_error: Option<String>,
    current: Option<String>,

    pub init_calls: u32,
    pub close_calls: u32,
    pub height_reads: u32,
    pub triggers: u32,
    pub navigations: Vec<String>,
}

impl FakeDriver {
    pub fn new(listing_url: &str, listing_html: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.to_string(),
            listing_html: listing_html.into(),
            pages: HashMap::new(),
            unreachable: HashSet::new(),
            heights: Heights::Sequence(vec![1000]),
            fail_init: false,
            interact_error: None,
            current: None,
            init_calls: 0,
            close_calls: 0,
            height_reads: 0,
            triggers: 0,
            navigations: Vec::new(),
        }
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Navigation to `url` fails
    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn with_heights(mut self, heights: Heights) -> Self {
        self.heights = heights;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Every click fails with a script error carrying `message`
    pub fn failing_interact(mut self, message: &str) -> Self {
        self.interact_error = Some(message.to_string());
        self
    }

    fn current_html(&self) -> Result<&str, RenderError> {
        let url = self.current.as_deref().ok_or(RenderError::Closed)?;
        if url == self.listing_url {
            return Ok(&self.listing_html);
        }
        self.pages
            .get(url)
            .map(String::as_str)
            .ok_or(RenderError::Closed)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn init(&mut self) -> Result<(), RenderError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(RenderError::Init("browser binary not found".to_string()));
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), RenderError> {
        self.navigations.push(url.to_string());

        let known = url == self.listing_url || self.pages.contains_key(url);
        if self.unreachable.contains(url) || !known {
            self.current = None;
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        self.current = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.current_html().map(str::to_string)
    }

    async fn current_height(&mut self) -> Result<u64, RenderError> {
        let read = self.height_reads as usize;
        self.height_reads += 1;

        let height = match &self.heights {
            Heights::Sequence(values) => values
                .get(read)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0),
            Heights::Unbounded => 100 * (read as u64 + 1),
        };
        Ok(height)
    }

    async fn trigger_more_content(&mut self) -> Result<(), RenderError> {
        self.triggers += 1;
        Ok(())
    }

    async fn interact(&mut self, selector: &str) -> Result<bool, RenderError> {
        if let Some(message) = &self.interact_error {
            return Err(RenderError::Script(message.clone()));
        }
        let html = self.current_html()?;
        Ok(HtmlDocument::parse("", html).count(selector) > 0)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.close_calls += 1;
        self.current = None;
        Ok(())
    }
}

/// Listing markup with one tile per href
pub fn listing_html(hrefs: &[&str]) -> String {
    let tiles: String = hrefs
        .iter()
        .map(|href| format!(r#"<div class="img-products"><a href="{}">tile</a></div>"#, href))
        .collect();
    format!("<html><body>{}</body></html>", tiles)
}

/// Item page markup; `stores` are `(location id, quantity text)` pairs
pub fn item_html(name: Option<&str>, price: &str, stores: &[(&str, &str)]) -> String {
    let name = name
        .map(|n| format!(r#"<h1 class="product-name">{}</h1>"#, n))
        .unwrap_or_default();
    let entries: String = stores
        .iter()
        .map(|(id, quantity)| {
            format!(
                r#"<li class="store-item" data-store-id="{}"><span class="quantity">{}</span></li>"#,
                id, quantity
            )
        })
        .collect();

    format!(
        r#"<html><body><div class="product-view">{}
            <span class="category-name">Spirits</span>
            <span class="price">{}</span>
            <button class="check-availability">Check stores</button>
            <ul>{}</ul>
        </div></body></html>"#,
        name, price, entries
    )
}

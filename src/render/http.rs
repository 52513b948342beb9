//! Static-markup page driver
//!
//! Fetches pages with a plain HTTP GET and serves the returned markup as the
//! rendered document. No scripts run, so the page never grows: discovery on a
//! server-rendered listing stabilises after the configured number of settles.

use crate::render::{Document, HtmlDocument, PageDriver};
use crate::RenderError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// A page loaded by the static driver
struct LoadedPage {
    url: String,
    body: String,
}

/// Page driver backed by a reqwest client
pub struct HttpDriver {
    user_agent: String,
    client: Option<Client>,
    page: Option<LoadedPage>,
}

impl HttpDriver {
    /// Creates a driver that identifies itself with `user_agent`
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            client: None,
            page: None,
        }
    }

    fn page(&self) -> Result<&LoadedPage, RenderError> {
        self.page.as_ref().ok_or(RenderError::Closed)
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn init(&mut self) -> Result<(), RenderError> {
        let client = Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| RenderError::Init(e.to_string()))?;

        self.client = Some(client);
        tracing::debug!("HTTP page driver initialized");
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let client = self.client.as_ref().ok_or(RenderError::Closed)?;

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                RenderError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify)?;

        self.page = Some(LoadedPage {
            url: final_url,
            body,
        });
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|page| page.url.as_str())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        Ok(self.page()?.body.clone())
    }

    async fn current_height(&mut self) -> Result<u64, RenderError> {
        // Markup length stands in for layout height
        Ok(self.page()?.body.len() as u64)
    }

    async fn trigger_more_content(&mut self) -> Result<(), RenderError> {
        self.page()?;
        Ok(())
    }

    async fn interact(&mut self, selector: &str) -> Result<bool, RenderError> {
        let page = self.page()?;
        let present = HtmlDocument::parse(&page.url, &page.body).count(selector) > 0;
        if present {
            tracing::debug!("Static driver cannot click '{}'; using markup as served", selector);
        }
        Ok(present)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.page = None;
        self.client = None;
        Ok(())
    }
}

//! Headless Chromium page driver
//!
//! Drives a real browser over the DevTools protocol so script-rendered
//! listings and click-to-reveal widgets behave as they do for a visitor.

use crate::render::PageDriver;
use crate::RenderError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound on any single DevTools command that has no caller timeout
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const LAUNCH_ARGS: [&str; 5] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
];

/// An open browser with its single working tab
struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Page driver backed by chromiumoxide
pub struct ChromeDriver {
    headless: bool,
    user_agent: String,
    session: Option<Session>,
    current_url: Option<String>,
}

impl ChromeDriver {
    pub fn new(headless: bool, user_agent: impl Into<String>) -> Self {
        Self {
            headless,
            user_agent: user_agent.into(),
            session: None,
            current_url: None,
        }
    }

    fn page(&self) -> Result<&Page, RenderError> {
        self.session
            .as_ref()
            .map(|session| &session.page)
            .ok_or(RenderError::Closed)
    }
}

/// Runs a DevTools command under `COMMAND_TIMEOUT`
async fn bounded<T, E, F>(what: &str, command: F) -> Result<T, RenderError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(COMMAND_TIMEOUT, command).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(RenderError::Script(format!("{}: {}", what, e))),
        Err(_) => Err(RenderError::WaitTimeout {
            condition: what.to_string(),
            timeout: COMMAND_TIMEOUT,
        }),
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn init(&mut self) -> Result<(), RenderError> {
        tracing::info!("Launching browser (headless: {})", self.headless);

        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .args(LAUNCH_ARGS);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Init)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;
        page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;

        self.session = Some(Session {
            browser,
            page,
            handler,
        });
        tracing::info!("Browser initialized successfully");
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RenderError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                })
            }
        }
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        let page = self.page()?;
        bounded("page content", page.content()).await
    }

    async fn current_height(&mut self) -> Result<u64, RenderError> {
        let page = self.page()?;
        let result = bounded("scroll height", page.evaluate("document.body.scrollHeight")).await?;
        result
            .into_value::<u64>()
            .map_err(|e| RenderError::Script(format!("scroll height: {}", e)))
    }

    async fn trigger_more_content(&mut self) -> Result<(), RenderError> {
        let page = self.page()?;
        bounded(
            "scroll to bottom",
            page.evaluate("window.scrollTo(0, document.body.scrollHeight)"),
        )
        .await?;
        Ok(())
    }

    async fn interact(&mut self, selector: &str) -> Result<bool, RenderError> {
        let page = self.page()?;
        let element = match tokio::time::timeout(COMMAND_TIMEOUT, page.find_element(selector)).await
        {
            Ok(Ok(element)) => element,
            _ => {
                tracing::debug!("No element matches '{}'", selector);
                return Ok(false);
            }
        };
        bounded("click", element.click()).await?;
        Ok(true)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        self.current_url = None;
        tracing::info!("Closing browser...");

        if let Err(e) = session.page.close().await {
            tracing::warn!("Error closing page: {}", e);
        }
        let closed = session.browser.close().await;
        if let Err(e) = session.browser.wait().await {
            tracing::warn!("Error waiting for browser exit: {}", e);
        }
        session.handler.abort();

        closed.map_err(|e| RenderError::Script(format!("browser close: {}", e)))?;
        tracing::info!("Browser closed");
        Ok(())
    }
}

//! Headless browser transport using chromiumoxide.
//!
//! Some FBref tables are only inserted into the DOM by client-side scripts.
//! A `BrowserSession` drives one headless Chrome for a whole run, opens a
//! tab per page and polls until the wanted element is present.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::{FbrefError, Result};
use crate::retry;

/// Interval between element presence checks
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One headless Chrome instance shared by every fetch of a run
///
/// Dropping the session aborts its event loop and lets chromiumoxide kill
/// the child process; [`BrowserSession::close`] shuts it down cleanly.
pub struct BrowserSession {
    browser: Browser,
    handle: JoinHandle<()>,
    config: BrowserConfig,
}

impl BrowserSession {
    /// Launch a new headless browser instance
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .window_size(1920, 1080)
            .request_timeout(config.page_load_timeout());

        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder
            .build()
            .map_err(|e| FbrefError::Browser(format!("Failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| FbrefError::Browser(format!("Failed to launch browser: {e}")))?;

        // Handler must keep running for the browser to respond
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler error: {e}");
                }
            }
        });

        info!("Headless browser launched");
        Ok(Self {
            browser,
            handle,
            config,
        })
    }

    /// Outer HTML of the element with `element_id` on the page at `url`
    ///
    /// Page loads that time out and elements that never appear are retried
    /// with the configured backoff.
    pub async fn fetch_region(&self, url: &str, element_id: &str) -> Result<String> {
        retry::with_backoff(&self.config.retry_policy(), url, || {
            self.fetch_region_once(url, element_id)
        })
        .await
    }

    async fn fetch_region_once(&self, url: &str, element_id: &str) -> Result<String> {
        let load_timeout = self.config.page_load_timeout();
        let page = timeout(load_timeout, self.browser.new_page(url))
            .await
            .map_err(|_| FbrefError::ElementTimeout {
                element_id: element_id.to_string(),
                secs: load_timeout.as_secs(),
            })?
            .map_err(|e| FbrefError::Browser(format!("Failed to open {url}: {e}")))?;

        let result = self.wait_for_element(&page, element_id).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close tab for {url}: {e}");
        }

        result
    }

    /// Poll until the element exists and return its outer HTML
    async fn wait_for_element(&self, page: &Page, element_id: &str) -> Result<String> {
        let wait = self.config.element_wait();
        let deadline = Instant::now() + wait;
        let css = format!("[id=\"{element_id}\"]");

        loop {
            if let Ok(element) = page.find_element(css.as_str()).await {
                let html = element
                    .outer_html()
                    .await
                    .map_err(|e| FbrefError::Browser(format!("Failed to read #{element_id}: {e}")))?;
                if let Some(html) = html {
                    return Ok(html);
                }
            }

            if Instant::now() >= deadline {
                return Err(FbrefError::ElementTimeout {
                    element_id: element_id.to_string(),
                    secs: wait.as_secs(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
        }
        self.handle.abort();
        info!("Headless browser closed");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

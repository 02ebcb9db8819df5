//! HTTP client with retry logic for FBref
//!
//! This module provides the plain-HTTP transport. Transient statuses
//! (429, 500, 502, 503, 504) and connection failures are retried with
//! exponential backoff before an error is surfaced. Forbidden responses are
//! inspected for anti-bot pages.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::{FbrefError, Result};
use crate::retry;

/// Accept header of a desktop browser navigation
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Accept-Language header for English content
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Header name fragments worth logging on a failed response
const DIAGNOSTIC_HEADERS: [&str; 6] = ["server", "cloudflare", "cf-", "x-", "set-cookie", "content-type"];

/// Characters of a forbidden body kept in the debug log
const BODY_PREVIEW_CHARS: usize = 1000;

/// Anti-bot marker found in a forbidden response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSignal {
    CloudflareChallenge,
    Captcha,
    AccessDenied,
    BotDetection,
}

impl BlockSignal {
    /// Every marker present in `body`, matched case-insensitively
    pub fn detect(body: &str) -> Vec<BlockSignal> {
        let body = body.to_lowercase();
        let found = |needles: &[&str]| needles.iter().any(|n| body.contains(n));

        let mut signals = Vec::new();
        if found(&["cloudflare", "challenge"]) {
            signals.push(BlockSignal::CloudflareChallenge);
        }
        if found(&["captcha"]) {
            signals.push(BlockSignal::Captcha);
        }
        if found(&["access denied", "forbidden"]) {
            signals.push(BlockSignal::AccessDenied);
        }
        if found(&["bot", "automated"]) {
            signals.push(BlockSignal::BotDetection);
        }
        signals
    }
}

impl fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockSignal::CloudflareChallenge => "Cloudflare challenge",
            BlockSignal::Captcha => "CAPTCHA",
            BlockSignal::AccessDenied => "access denied message",
            BlockSignal::BotDetection => "bot detection message",
        })
    }
}

/// HTTP client for FBref with retry logic
///
/// This client automatically:
/// - Retries on transient errors (429, 5xx gateway errors) with exponential backoff
/// - Sets browser-like headers
pub struct StatsClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Retry and endpoint settings
    config: HttpConfig,
}

impl StatsClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch HTML content from a URL
    ///
    /// # Arguments
    /// * `url` - Absolute page URL
    ///
    /// # Errors
    /// - `FbrefError::HttpError` - Network error after all retries
    /// - `FbrefError::RateLimited` - Server kept returning 429
    /// - `FbrefError::NotFound` - Server returned 404
    /// - `FbrefError::Status` - Any other failing status
    pub async fn fetch(&self, url: &str) -> Result<String> {
        retry::with_backoff(&self.config.retry_policy(), url, || self.fetch_once(url)).await
    }

    /// Single request, no retries
    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        log_diagnostic_headers(url, status, response.headers());

        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            debug!(url, "403 body: {preview}");

            let signals = BlockSignal::detect(&body);
            for signal in &signals {
                warn!(url, "{signal} detected");
            }
            if !signals.is_empty() {
                return Err(FbrefError::Blocked {
                    url: url.to_string(),
                    signals: signals.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                });
            }
        }

        Err(status_error(status, url))
    }

    /// Retry settings in use
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

fn log_diagnostic_headers(url: &str, status: StatusCode, headers: &HeaderMap) {
    for (name, value) in headers {
        let name = name.as_str();
        if DIAGNOSTIC_HEADERS.iter().any(|k| name.contains(k)) {
            debug!(url, status = status.as_u16(), "{name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }
}

fn status_error(status: StatusCode, url: &str) -> FbrefError {
    match status {
        StatusCode::NOT_FOUND => FbrefError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => FbrefError::RateLimited(url.to_string()),
        s => FbrefError::Status {
            status: s.as_u16(),
            url: url.to_string(),
        },
    }
}

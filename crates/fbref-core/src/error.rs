//! Error types for the FBref scraper
//!
//! This module defines all error types used throughout the library.
//! FbrefError implements Serialize so run reports can be written as JSON.

use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for FBref scraper operations
#[derive(Error, Debug)]
pub enum FbrefError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a status that is not retried, or the retry budget ran out
    #[error("HTTP {status} for {url}")]
    Status {
        /// Final status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Rate limited by the server (HTTP 429) after all retries
    #[error("Rate limited - too many requests for {0}")]
    RateLimited(String),

    /// Forbidden response carrying an anti-bot page (HTTP 403)
    #[error("Blocked at {url}: {signals}")]
    Blocked {
        /// Requested URL
        url: String,
        /// Markers found in the response body
        signals: String,
    },

    /// Requested page does not exist (HTTP 404)
    #[error("Page not found: {0}")]
    NotFound(String),

    /// The content region was not present in the fetched page
    #[error("Element #{element_id} not found in {url}")]
    ElementNotFound {
        /// Id of the wrapping element
        element_id: String,
        /// Page the element was looked up in
        url: String,
    },

    /// The content region did not materialize within the wait budget
    #[error("Element #{element_id} did not appear within {secs}s")]
    ElementTimeout {
        /// Id of the wrapping element
        element_id: String,
        /// Seconds waited
        secs: u64,
    },

    /// Headless browser failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    /// Staged content holds no table
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    /// Season identifier is not of the form YYYY-YYYY
    #[error("Invalid season: {0}")]
    InvalidSeason(String),

    /// Category name is not one of the known categories
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Local filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV export failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FbrefError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::RateLimited(_) | Self::ElementTimeout { .. } => true,
            _ => false,
        }
    }
}

/// HTTP statuses that are retried with backoff.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Whether an HTTP status belongs to the retried set.
pub fn is_retryable_status(status: u16) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Serialize FbrefError as its display string
impl Serialize for FbrefError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for FBref scraper operations
pub type Result<T> = std::result::Result<T, FbrefError>;

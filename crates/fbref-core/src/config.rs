//! Configuration for the FBref scraper.
//!
//! Values are layered: built-in defaults, then an optional `fbref.toml`
//! (or a file passed explicitly), then `FBREF_*` environment variables
//! such as `FBREF_PACING__MIN_SECS=3`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FbrefError, Result};
use crate::retry::RetryPolicy;
use crate::types::{Season, DEFAULT_SEASONS};

/// Site root every category path is appended to
pub const FBREF_BASE_URL: &str = "https://fbref.com";

/// Default User-Agent mimicking a desktop Chrome
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_factor_secs * 2^n`
    #[serde(default = "default_backoff_factor_secs")]
    pub backoff_factor_secs: f64,
}

fn default_base_url() -> String {
    FBREF_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_factor_secs() -> f64 {
    5.0
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor_secs: default_backoff_factor_secs(),
        }
    }
}

impl HttpConfig {
    /// Retry policy for page requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, secs(self.backoff_factor_secs))
    }
}

/// Seconds as a `Duration`; negative or NaN is zero, too large saturates.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

fn check_secs(key: &str, value: f64) -> Result<()> {
    Duration::try_from_secs_f64(value).map(|_| ()).map_err(|e| {
        FbrefError::Config(config::ConfigError::Message(format!(
            "{key} = {value} is not a usable number of seconds: {e}"
        )))
    })
}

/// Headless browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome executable; platform default when unset
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    /// How long to wait for the table element to appear
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,
    /// Upper bound for a full page load
    #[serde(default = "default_page_load_secs")]
    pub page_load_secs: u64,
    #[serde(default = "default_browser_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor_secs")]
    pub backoff_factor_secs: f64,
    /// Fixed pause after each browser fetch, used instead of the pacing range
    #[serde(default = "default_browser_pause_secs")]
    pub pause_secs: f64,
}

fn default_browser_max_retries() -> u32 {
    2
}

fn default_browser_pause_secs() -> f64 {
    8.0
}

fn default_element_wait_secs() -> u64 {
    20
}

fn default_page_load_secs() -> u64 {
    60
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            element_wait_secs: default_element_wait_secs(),
            page_load_secs: default_page_load_secs(),
            max_retries: default_browser_max_retries(),
            backoff_factor_secs: default_backoff_factor_secs(),
            pause_secs: default_browser_pause_secs(),
        }
    }
}

impl BrowserConfig {
    /// Retry policy for page loads
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, secs(self.backoff_factor_secs))
    }

    /// How long to wait for the table element
    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    /// Upper bound for opening a page
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }
}

/// Delay applied after every fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_pacing_min_secs")]
    pub min_secs: f64,
    #[serde(default = "default_pacing_max_secs")]
    pub max_secs: f64,
}

fn default_pacing_min_secs() -> f64 {
    5.0
}

fn default_pacing_max_secs() -> f64 {
    10.0
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_secs: default_pacing_min_secs(),
            max_secs: default_pacing_max_secs(),
        }
    }
}

/// Where staged markup and exports live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data_html")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data_out")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Seasons processed when none are given on the command line
    #[serde(default = "default_seasons")]
    pub seasons: Vec<String>,
}

fn default_seasons() -> Vec<String> {
    DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect()
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            browser: BrowserConfig::default(),
            pacing: PacingConfig::default(),
            paths: PathsConfig::default(),
            seasons: default_seasons(),
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from `fbref.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `file` instead of `fbref.toml` when given
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("fbref").required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&ScrapeConfig::default())?)
            .add_source(file_source)
            // Override with environment variables (FBREF_HTTP__MAX_RETRIES, etc.)
            .add_source(
                config::Environment::with_prefix("FBREF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ScrapeConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations that are negative, not finite, or too large
    pub fn validate(&self) -> Result<()> {
        check_secs("http.backoff_factor_secs", self.http.backoff_factor_secs)?;
        check_secs("browser.backoff_factor_secs", self.browser.backoff_factor_secs)?;
        check_secs("browser.pause_secs", self.browser.pause_secs)?;
        check_secs("pacing.min_secs", self.pacing.min_secs)?;
        check_secs("pacing.max_secs", self.pacing.max_secs)?;
        Ok(())
    }

    /// Configured seasons, validated
    pub fn seasons(&self) -> Result<Vec<Season>> {
        Season::parse_list(&self.seasons)
    }
}

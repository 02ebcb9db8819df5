//! Fetch stage
//!
//! One routine for every category: build the season URL, pull the page
//! through the configured transport, cut out the table's wrapping element
//! and stage it. Each fetch is followed by a pacing pause.

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::client::StatsClient;
use crate::config::ScrapeConfig;
use crate::error::{FbrefError, Result};
use crate::pacing::Pacer;
use crate::parser::extract_region;
use crate::staging::Staging;
use crate::types::{Category, FetchMode, Season};

#[cfg(feature = "browser")]
use crate::browser::BrowserSession;

/// How pages are retrieved
pub enum Transport {
    /// Plain HTTP client
    Http(StatsClient),
    /// Headless Chrome session
    #[cfg(feature = "browser")]
    Browser(BrowserSession),
}

impl Transport {
    /// Create the transport for `mode`, launching a browser if needed
    pub async fn connect(mode: FetchMode, config: &ScrapeConfig) -> Result<Self> {
        match mode {
            FetchMode::Http => Ok(Transport::Http(StatsClient::with_config(config.http.clone())?)),
            #[cfg(feature = "browser")]
            FetchMode::Browser => Ok(Transport::Browser(
                BrowserSession::launch(config.browser.clone()).await?,
            )),
            #[cfg(not(feature = "browser"))]
            FetchMode::Browser => Err(FbrefError::Browser(
                "built without the `browser` feature".to_string(),
            )),
        }
    }

    /// Mode this transport implements
    pub fn mode(&self) -> FetchMode {
        match self {
            Transport::Http(_) => FetchMode::Http,
            #[cfg(feature = "browser")]
            Transport::Browser(_) => FetchMode::Browser,
        }
    }

    /// Outer HTML of the element `element_id` on the page at `url`
    pub async fn fetch_region(&self, url: &str, element_id: &str) -> Result<String> {
        match self {
            Transport::Http(client) => {
                let page = client.fetch(url).await?;
                extract_region(&page, element_id)?.ok_or_else(|| FbrefError::ElementNotFound {
                    element_id: element_id.to_string(),
                    url: url.to_string(),
                })
            }
            #[cfg(feature = "browser")]
            Transport::Browser(session) => session.fetch_region(url, element_id).await,
        }
    }

    /// Release the transport
    pub async fn close(self) -> Result<()> {
        match self {
            Transport::Http(_) => Ok(()),
            #[cfg(feature = "browser")]
            Transport::Browser(session) => session.close().await,
        }
    }
}

/// Season whose fetch failed
#[derive(Debug, Clone, Serialize)]
pub struct SeasonFailure {
    /// The season
    pub season: Season,
    /// Error message
    pub error: String,
}

/// Outcome of fetching one category over several seasons
#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    /// The category
    pub category: Category,
    /// Seasons staged successfully
    pub fetched: Vec<Season>,
    /// Seasons that failed
    pub failed: Vec<SeasonFailure>,
}

/// Fetches category pages and stages their table markup
pub struct Fetcher {
    transport: Transport,
    staging: Staging,
    pacer: Pacer,
    base_url: String,
}

impl Fetcher {
    /// Create a fetcher from its parts
    pub fn new(transport: Transport, staging: Staging, pacer: Pacer, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            staging,
            pacer,
            base_url: base_url.into(),
        }
    }

    /// Create a fetcher for `mode` from configuration
    ///
    /// Browser fetches pause a fixed interval, HTTP fetches a random one.
    pub async fn from_config(config: &ScrapeConfig, mode: FetchMode) -> Result<Self> {
        let transport = Transport::connect(mode, config).await?;
        let pacer = match mode {
            FetchMode::Http => Pacer::from_config(&config.pacing),
            FetchMode::Browser => Pacer::fixed(config.browser.pause_secs),
        };
        Ok(Self::new(
            transport,
            Staging::new(&config.paths.staging_dir),
            pacer,
            config.http.base_url.clone(),
        ))
    }

    /// Transport mode
    pub fn mode(&self) -> FetchMode {
        self.transport.mode()
    }

    /// Staging area files are written to
    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    /// Page URL of a category and season
    pub fn url_for(&self, category: Category, season: &Season) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), category.page_path(season))
    }

    /// Fetch, stage and return the table markup of one category and season.
    ///
    /// The pacing pause runs whether or not the fetch succeeded.
    pub async fn fetch(&self, category: Category, season: &Season) -> Result<String> {
        let span = info_span!("fetch", %category, %season);
        let result = self.fetch_and_stage(category, season).instrument(span).await;
        self.pacer.pause().await;
        result
    }

    async fn fetch_and_stage(&self, category: Category, season: &Season) -> Result<String> {
        let url = self.url_for(category, season);
        info!("Fetching {}", url);

        let markup = self.transport.fetch_region(&url, category.element_id()).await?;
        let path = self.staging.write(category, season, self.mode(), &markup)?;
        info!("Saved {}", path.display());

        Ok(markup)
    }

    /// Fetch every season of a category, continuing past failures
    pub async fn fetch_seasons(&self, category: Category, seasons: &[Season]) -> FetchSummary {
        let mut summary = FetchSummary {
            category,
            fetched: Vec::new(),
            failed: Vec::new(),
        };

        for season in seasons {
            match self.fetch(category, season).await {
                Ok(_) => summary.fetched.push(season.clone()),
                Err(e) => {
                    warn!(%category, %season, "Failed to fetch: {e}");
                    summary.failed.push(SeasonFailure {
                        season: season.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            %category,
            fetched = summary.fetched.len(),
            failed = summary.failed.len(),
            "All seasons processed"
        );
        summary
    }

    /// Release the transport
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_fetcher(base_url: String, staging: Staging) -> Fetcher {
        let config = HttpConfig {
            max_retries: 1,
            backoff_factor_secs: 0.01,
            timeout_secs: 5,
            ..HttpConfig::default()
        };
        let client = StatsClient::with_config(config).unwrap();
        Fetcher::new(Transport::Http(client), staging, Pacer::none(), base_url)
    }

    fn season(raw: &str) -> Season {
        Season::parse(raw).unwrap()
    }

    const PAGE: &str = r#"<html><body>
        <div id="div_stats_passing"><table>
            <thead><tr><th>Player</th><th>Cmp</th></tr></thead>
            <tbody><tr><td>Rodri</td><td>2500</td></tr></tbody>
        </table></div>
    </body></html>"#;

    #[test]
    fn test_url_for() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = http_fetcher("https://fbref.com/".to_string(), Staging::new(dir.path()));
        assert_eq!(
            fetcher.url_for(Category::Shooting, &season("2023-2024")),
            "https://fbref.com/en/comps/Big5/2023-2024/shooting/players/2023-2024-Big-5-European-Leagues-Stats"
        );
    }

    #[tokio::test]
    async fn test_fetch_stages_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/en/comps/Big5/2022-2023/passing/players/2022-2023-Big-5-European-Leagues-Stats",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = http_fetcher(server.uri(), Staging::new(dir.path()));
        let s = season("2022-2023");

        let markup = fetcher.fetch(Category::Passing, &s).await.unwrap();
        assert!(markup.starts_with("<div id=\"div_stats_passing\">"));

        let staged = fetcher
            .staging()
            .read(Category::Passing, &s, FetchMode::Http)
            .unwrap()
            .unwrap();
        assert_eq!(staged, markup);
    }

    #[tokio::test]
    async fn test_fetch_missing_element() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = http_fetcher(server.uri(), Staging::new(dir.path()));
        let s = season("2022-2023");

        match fetcher.fetch(Category::Wages, &s).await {
            Err(FbrefError::ElementNotFound { element_id, .. }) => {
                assert_eq!(element_id, "div_squad_wages")
            }
            other => panic!("Expected ElementNotFound, got {other:?}"),
        }
        assert!(!fetcher.staging().contains(Category::Wages, &s, FetchMode::Http));
    }

    #[tokio::test]
    async fn test_fetch_seasons_continues_past_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/en/comps/Big5/2021-2022/passing/players/2021-2022-Big-5-European-Leagues-Stats",
            ))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = http_fetcher(server.uri(), Staging::new(dir.path()));
        let seasons = vec![season("2020-2021"), season("2021-2022"), season("2022-2023")];

        let summary = fetcher.fetch_seasons(Category::Passing, &seasons).await;

        assert_eq!(summary.fetched, vec![season("2020-2021"), season("2022-2023")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].season, season("2021-2022"));
        assert!(summary.failed[0].error.contains("500"));
    }

    #[tokio::test]
    async fn test_http_transport_mode_and_close() {
        let transport = Transport::connect(FetchMode::Http, &ScrapeConfig::default())
            .await
            .unwrap();
        assert_eq!(transport.mode(), FetchMode::Http);
        assert!(transport.close().await.is_ok());
    }
}

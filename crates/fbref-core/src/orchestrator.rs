//! Category orchestration
//!
//! Runs the fetch stage and then the parse stage for each category, and
//! merges the per-season tables into one result per category.

use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::fetcher::{FetchSummary, Fetcher};
use crate::parser::extract_table;
use crate::staging::Staging;
use crate::types::{Category, CategoryResult, FetchMode, Season, SeasonSkip, SkipReason};

/// Parse the staged files of one category into a merged result.
///
/// Seasons without a staged file, or whose markup holds no table, are
/// skipped and recorded in `CategoryResult::skipped`; the others are
/// concatenated in the order given.
///
/// # Returns
/// A result that may be empty when nothing could be extracted
pub fn collect_category(
    staging: &Staging,
    category: Category,
    mode: FetchMode,
    seasons: &[Season],
) -> CategoryResult {
    let mut result = CategoryResult::empty(category);

    for season in seasons {
        let reason = match staging.read(category, season, mode) {
            Ok(Some(markup)) => match extract_table(&markup, season) {
                Ok(table) => {
                    debug!(%category, %season, rows = table.len(), "extracted table");
                    result.table.append(table);
                    result.seasons.push(season.clone());
                    continue;
                }
                Err(e) => {
                    warn!(%category, %season, "Skipping season: {e}");
                    SkipReason::MalformedMarkup(e.to_string())
                }
            },
            Ok(None) => {
                warn!(
                    %category,
                    %season,
                    "No staged file at {}, skipping",
                    staging.path_for(category, season, mode).display()
                );
                SkipReason::MissingStagedFile
            }
            Err(e) => {
                warn!(%category, %season, "Skipping season: {e}");
                SkipReason::ReadFailed(e.to_string())
            }
        };

        result.skipped.push(SeasonSkip {
            season: season.clone(),
            reason,
        });
    }

    info!(
        %category,
        rows = result.table.len(),
        seasons = result.seasons.len(),
        skipped = result.skipped.len(),
        "Category collected"
    );
    result
}

/// Parse already staged files for several categories
pub fn parse_only(
    staging: &Staging,
    categories: &[Category],
    mode: FetchMode,
    seasons: &[Season],
) -> Vec<CategoryResult> {
    categories
        .iter()
        .map(|&category| collect_category(staging, category, mode, seasons))
        .collect()
}

/// Everything a full run produced
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// One result per requested category, in request order
    pub results: Vec<CategoryResult>,
    /// Fetch outcome per category
    pub fetches: Vec<FetchSummary>,
}

/// Fetch then parse, category by category
pub struct Pipeline {
    fetcher: Fetcher,
}

impl Pipeline {
    /// Create a pipeline around a fetcher
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// The fetcher in use
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Run both stages for every category.
    ///
    /// Per-season failures never abort the run; they show up as fetch
    /// failures and skipped seasons.
    pub async fn run(&self, categories: &[Category], seasons: &[Season]) -> RunOutput {
        let mut output = RunOutput {
            results: Vec::with_capacity(categories.len()),
            fetches: Vec::with_capacity(categories.len()),
        };

        for &category in categories {
            info!(%category, seasons = seasons.len(), "Starting category");
            let summary = self.fetcher.fetch_seasons(category, seasons).await;
            output.fetches.push(summary);

            let result = collect_category(self.fetcher.staging(), category, self.fetcher.mode(), seasons);
            output.results.push(result);
        }

        output
    }

    /// Release the fetcher's transport
    pub async fn close(self) -> Result<()> {
        self.fetcher.close().await
    }
}

/// Acquire a transport, run the pipeline, and release the transport.
///
/// The transport is released whatever the run produced.
pub async fn run_scoped(
    config: &ScrapeConfig,
    mode: FetchMode,
    categories: &[Category],
    seasons: &[Season],
) -> Result<RunOutput> {
    let pipeline = Pipeline::new(Fetcher::from_config(config, mode).await?);
    let output = pipeline.run(categories, seasons).await;
    pipeline.close().await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StatsClient;
    use crate::config::{HttpConfig, PacingConfig};
    use crate::fetcher::Transport;
    use crate::pacing::Pacer;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn season(raw: &str) -> Season {
        Season::parse(raw).unwrap()
    }

    fn fragment(team: &str, goals: &str) -> String {
        format!(
            "<div id=\"div_stats_teams_standard_for\"><table>\
             <thead><tr><th>Squad</th><th>Gls</th></tr></thead>\
             <tbody><tr><th>{team}</th><td>{goals}</td></tr></tbody>\
             </table></div>"
        )
    }

    #[test]
    fn test_collect_concatenates_in_season_order() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let seasons = vec![season("2021-2022"), season("2022-2023")];

        staging
            .write(Category::SquadStats, &seasons[0], FetchMode::Http, &fragment("Arsenal", "61"))
            .unwrap();
        staging
            .write(Category::SquadStats, &seasons[1], FetchMode::Http, &fragment("Arsenal", "88"))
            .unwrap();

        let result = collect_category(&staging, Category::SquadStats, FetchMode::Http, &seasons);

        assert_eq!(result.table.columns, ["Squad", "Gls", "Season"]);
        assert_eq!(
            result.table.rows,
            vec![
                vec!["Arsenal", "61", "2021-2022"],
                vec!["Arsenal", "88", "2022-2023"],
            ]
        );
        assert_eq!(result.seasons, seasons);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_missing_staged_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let seasons = vec![season("2020-2021"), season("2021-2022"), season("2022-2023")];

        staging
            .write(Category::SquadStats, &seasons[0], FetchMode::Http, &fragment("Chelsea", "58"))
            .unwrap();
        staging
            .write(Category::SquadStats, &seasons[2], FetchMode::Http, &fragment("Chelsea", "38"))
            .unwrap();

        let result = collect_category(&staging, Category::SquadStats, FetchMode::Http, &seasons);

        assert_eq!(result.table.len(), 2);
        assert_eq!(result.seasons, vec![season("2020-2021"), season("2022-2023")]);
        assert_eq!(
            result.skipped,
            vec![SeasonSkip {
                season: season("2021-2022"),
                reason: SkipReason::MissingStagedFile,
            }]
        );
    }

    #[test]
    fn test_season_without_table_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let seasons = vec![season("2021-2022"), season("2022-2023")];

        staging
            .write(Category::SquadStats, &seasons[0], FetchMode::Http, "<div>blocked</div>")
            .unwrap();
        staging
            .write(Category::SquadStats, &seasons[1], FetchMode::Http, &fragment("Spurs", "70"))
            .unwrap();

        let result = collect_category(&staging, Category::SquadStats, FetchMode::Http, &seasons);

        assert_eq!(result.table.rows, vec![vec!["Spurs", "70", "2022-2023"]]);
        assert_eq!(result.skipped.len(), 1);
        assert!(matches!(
            result.skipped[0].reason,
            SkipReason::MalformedMarkup(_)
        ));
    }

    #[test]
    fn test_nothing_staged_gives_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());

        let result = collect_category(&staging, Category::Goalkeeping, FetchMode::Http, &Season::defaults());

        assert!(result.is_empty());
        assert_eq!(result.skipped.len(), 7);
    }

    #[test]
    fn test_mode_selects_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let seasons = vec![season("2022-2023")];

        staging
            .write(Category::SquadStats, &seasons[0], FetchMode::Browser, &fragment("Leeds", "48"))
            .unwrap();

        assert!(collect_category(&staging, Category::SquadStats, FetchMode::Http, &seasons).is_empty());
        assert_eq!(
            collect_category(&staging, Category::SquadStats, FetchMode::Browser, &seasons)
                .table
                .len(),
            1
        );
    }

    #[test]
    fn test_parse_only_one_result_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let categories = [Category::Wages, Category::SquadStats];

        let results = parse_only(&staging, &categories, FetchMode::Http, &[season("2022-2023")]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].category, Category::Wages);
        assert_eq!(results[1].category, Category::SquadStats);
    }

    #[tokio::test]
    async fn test_pipeline_run_fetches_then_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/en/comps/Big5/2022-2023/stats/squads/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<html><body>{}</body></html>",
                fragment("Arsenal", "88")
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = StatsClient::with_config(HttpConfig {
            max_retries: 0,
            ..HttpConfig::default()
        })
        .unwrap();
        let fetcher = Fetcher::new(
            Transport::Http(client),
            Staging::new(dir.path()),
            Pacer::none(),
            server.uri(),
        );
        let pipeline = Pipeline::new(fetcher);
        let seasons = vec![season("2021-2022"), season("2022-2023")];

        let output = pipeline.run(&[Category::SquadStats], &seasons).await;
        pipeline.close().await.unwrap();

        assert_eq!(output.fetches[0].fetched, vec![season("2022-2023")]);
        assert_eq!(output.fetches[0].failed.len(), 1);

        let result = &output.results[0];
        assert_eq!(result.table.rows, vec![vec!["Arsenal", "88", "2022-2023"]]);
        assert_eq!(result.skipped[0].reason, SkipReason::MissingStagedFile);
    }

    #[tokio::test]
    async fn test_run_scoped_returns_output_after_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/en/comps/Big5/2023-2024/stats/squads/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<html><body>{}</body></html>",
                fragment("Inter", "89")
            )))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = ScrapeConfig::default();
        config.http.base_url = server.uri();
        config.http.max_retries = 0;
        config.pacing = PacingConfig {
            min_secs: 0.0,
            max_secs: 0.0,
        };
        config.paths.staging_dir = dir.path().to_path_buf();

        let output = run_scoped(
            &config,
            FetchMode::Http,
            &[Category::SquadStats],
            &[season("2023-2024")],
        )
        .await
        .unwrap();

        assert_eq!(output.fetches.len(), 1);
        assert!(output.fetches[0].failed.is_empty());
        assert_eq!(output.results[0].table.rows, vec![vec!["Inter", "89", "2023-2024"]]);
        assert!(Staging::new(dir.path()).contains(Category::SquadStats, &season("2023-2024"), FetchMode::Http));
    }
}

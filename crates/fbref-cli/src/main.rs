mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fbref_core::{
    export_results, parse_only, run_scoped, Category, CategoryResult, Fetcher, ScrapeConfig, Season, Staging,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, ParseArgs, Selection};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fbref_core=info,fbref_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ScrapeConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Fetch(selection) => fetch(config, &selection).await,
        Command::Parse(args) => parse(config, &args),
        Command::Run(args) => run(config, &args).await,
        Command::Categories => {
            list_categories();
            Ok(())
        }
    }
}

async fn fetch(mut config: ScrapeConfig, selection: &Selection) -> Result<()> {
    let seasons = apply_selection(&mut config, selection)?;
    let categories = selection.categories();

    let fetcher = Fetcher::from_config(&config, selection.mode)
        .await
        .context("Failed to set up the fetcher")?;

    let mut summaries = Vec::with_capacity(categories.len());
    for &category in &categories {
        summaries.push(fetcher.fetch_seasons(category, &seasons).await);
    }
    fetcher.close().await.context("Failed to release the transport")?;

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn parse(mut config: ScrapeConfig, args: &ParseArgs) -> Result<()> {
    let seasons = apply_selection(&mut config, &args.selection)?;
    let staging = Staging::new(&config.paths.staging_dir);

    let results = parse_only(&staging, &args.selection.categories(), args.selection.mode, &seasons);
    export(&config, args, &results)
}

async fn run(mut config: ScrapeConfig, args: &ParseArgs) -> Result<()> {
    let seasons = apply_selection(&mut config, &args.selection)?;

    let output = run_scoped(&config, args.selection.mode, &args.selection.categories(), &seasons)
        .await
        .context("Pipeline failed")?;

    for summary in &output.fetches {
        if !summary.failed.is_empty() {
            warn!(
                category = %summary.category,
                "{} of {} seasons failed to fetch",
                summary.failed.len(),
                seasons.len()
            );
        }
    }
    export(&config, args, &output.results)
}

/// Fold CLI overrides into the configuration and resolve the season list
fn apply_selection(config: &mut ScrapeConfig, selection: &Selection) -> Result<Vec<Season>> {
    if let Some(dir) = &selection.staging_dir {
        config.paths.staging_dir = dir.clone();
    }
    if selection.seasons.is_empty() {
        config.seasons().context("Invalid season in configuration")
    } else {
        Ok(selection.seasons.clone())
    }
}

fn export(config: &ScrapeConfig, args: &ParseArgs, results: &[CategoryResult]) -> Result<()> {
    let out_dir: PathBuf = args.out_dir.clone().unwrap_or_else(|| config.paths.output_dir.clone());

    for result in results {
        info!(
            category = %result.category,
            rows = result.table.len(),
            seasons = result.seasons.len(),
            skipped = result.skipped.len(),
            "Category result"
        );
    }

    let written = export_results(results, &out_dir, args.format)
        .with_context(|| format!("Failed to export {} files to {}", args.format, out_dir.display()))?;

    for path in &written {
        println!("{}", path.display());
    }
    if written.is_empty() {
        warn!("No category produced any rows");
    }
    Ok(())
}

fn list_categories() {
    println!("{:<12} {:<18} {:<30} {}", "NAME", "URL PATH", "ELEMENT ID", "FILE STEM");
    for category in Category::ALL {
        println!(
            "{:<12} {:<18} {:<30} {}",
            category.name(),
            category.url_path(),
            category.element_id(),
            category.file_stem()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbref_core::ExportFormat;

    #[test]
    fn test_apply_selection_overrides() {
        let cli = Cli::parse_from([
            "fbref-cli",
            "parse",
            "--seasons",
            "2019-2020",
            "--staging-dir",
            "/tmp/staged",
        ]);
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };

        let mut config = ScrapeConfig::default();
        let seasons = apply_selection(&mut config, &args.selection).unwrap();

        assert_eq!(seasons, vec![Season::parse("2019-2020").unwrap()]);
        assert_eq!(config.paths.staging_dir, PathBuf::from("/tmp/staged"));
        assert_eq!(args.format, ExportFormat::Csv);
    }

    #[test]
    fn test_apply_selection_uses_configured_seasons() {
        let cli = Cli::parse_from(["fbref-cli", "parse"]);
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };

        let mut config = ScrapeConfig::default();
        let seasons = apply_selection(&mut config, &args.selection).unwrap();

        assert_eq!(seasons, Season::defaults());
    }
}

//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fbref_core::{Category, ExportFormat, FetchMode, Season};

#[derive(Debug, Parser)]
#[command(name = "fbref-cli")]
#[command(about = "Scrapes FBref Big 5 European Leagues statistics into per-category tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true, env = "FBREF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch category pages and stage their table markup
    Fetch(Selection),
    /// Parse staged markup into one table per category and export it
    Parse(ParseArgs),
    /// Fetch, then parse and export
    Run(ParseArgs),
    /// List the known categories
    Categories,
}

/// Which categories and seasons to work on
#[derive(Debug, Args)]
pub struct Selection {
    /// Comma-separated categories (default: all)
    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<Category>,

    /// Comma-separated seasons such as 2022-2023 (default: configured seasons)
    #[arg(long, value_delimiter = ',')]
    pub seasons: Vec<Season>,

    /// Directory staged markup is written to and read from
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// How pages are retrieved
    #[arg(long, default_value_t = FetchMode::Http)]
    pub mode: FetchMode,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Directory exported tables are written to
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Export format
    #[arg(long, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}

impl Selection {
    /// Requested categories, or all of them
    pub fn categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.categories.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "fbref-cli",
            "run",
            "--categories",
            "wages,passing",
            "--seasons",
            "2021-2022,2022-2023",
            "--mode",
            "browser",
            "--format",
            "json",
        ]);

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.selection.categories(), vec![Category::Wages, Category::Passing]);
        assert_eq!(args.selection.seasons.len(), 2);
        assert_eq!(args.selection.mode, FetchMode::Browser);
        assert_eq!(args.format, ExportFormat::Json);
    }

    #[test]
    fn test_defaults_to_all_categories() {
        let cli = Cli::parse_from(["fbref-cli", "fetch"]);
        let Command::Fetch(selection) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(selection.categories().len(), 7);
        assert!(selection.seasons.is_empty());
        assert_eq!(selection.mode, FetchMode::Http);
    }

    #[test]
    fn test_rejects_bad_season() {
        assert!(Cli::try_parse_from(["fbref-cli", "parse", "--seasons", "2022-2024"]).is_err());
    }
}

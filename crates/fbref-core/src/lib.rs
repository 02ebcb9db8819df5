//! FBref Scraper Core Library
//!
//! This crate collects Big 5 European Leagues statistics from FBref.com
//! over several seasons and turns them into one table per category.
//!
//! # Features
//! - Fetch category pages over HTTP or through a headless browser
//! - Stage the table markup of each (category, season) on disk
//! - Extract tables with header/row count reconciliation
//! - Merge seasons into one season-stamped table per category
//! - Paced requests with retry and exponential backoff
//! - Export to CSV or JSON

#[cfg(feature = "browser")]
pub mod browser;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod orchestrator;
pub mod pacing;
pub mod parser;
pub mod retry;
pub mod staging;
pub mod types;

// Re-export main types for convenience
pub use client::{BlockSignal, StatsClient};
pub use config::ScrapeConfig;
pub use error::{FbrefError, Result};
pub use export::{export_results, ExportFormat};
pub use fetcher::{FetchSummary, Fetcher, Transport};
pub use orchestrator::{collect_category, parse_only, run_scoped, Pipeline, RunOutput};
pub use pacing::Pacer;
pub use retry::RetryPolicy;
pub use staging::Staging;
pub use types::{
    Category, CategoryResult, FetchMode, Season, SeasonSkip, SkipReason, StatTable, DEFAULT_SEASONS,
    SEASON_COLUMN,
};

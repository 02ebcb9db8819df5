//! HTML parsers for FBref pages
//!
//! This module contains the two parsing steps of the pipeline:
//! - `region`: cut the element wrapping a category's table out of a full page
//! - `table`: turn a staged table fragment into a season-stamped `StatTable`

pub mod region;
pub mod table;

// Re-export main parsing functions
pub use region::extract_region;
pub use table::{extract_table, extract_table_with, reconcile_trim_end, ReconcilePolicy};

use scraper::Selector;

use crate::error::{FbrefError, Result};

/// Compile a CSS selector, mapping failures to a parse error.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FbrefError::ParseError(format!("Invalid selector {css}: {e:?}")))
}

//! Table extractor for staged FBref markup
//!
//! Turns the markup of one staged file into a `StatTable`: labels come from
//! the header, values from the body, and the two are reconciled when their
//! counts disagree.

use std::sync::OnceLock;

use regex_lite::Regex;
use scraper::{ElementRef, Html};

use crate::error::{FbrefError, Result};
use crate::types::{Season, StatTable, SEASON_COLUMN};

use super::selector;

/// Reconciles header labels with body rows before they are joined.
///
/// Receives the labels and the raw rows and returns them with equal widths.
pub type ReconcilePolicy = fn(Vec<String>, Vec<Vec<String>>) -> (Vec<String>, Vec<Vec<String>>);

/// Extract the table of a staged fragment and stamp it with a season.
///
/// Uses [`reconcile_trim_end`] to line labels up with values.
///
/// # Arguments
/// * `markup` - Raw staged HTML holding one table
/// * `season` - Season the rows belong to
///
/// # Returns
/// * `Ok(StatTable)` whose last column is `Season`
/// * `Err(FbrefError::MalformedMarkup)` if the markup holds no table
///
/// # Examples
/// ```
/// use fbref_core::{parser::extract_table, Season};
///
/// let html = r#"<table>
///   <thead><tr><th>Team</th><th>Goals</th></tr></thead>
///   <tbody><tr><td>Arsenal</td><td>88</td><td>extra</td></tr></tbody>
/// </table>"#;
/// let season = Season::parse("2022-2023").unwrap();
/// let table = extract_table(html, &season).unwrap();
///
/// assert_eq!(table.columns, ["Team", "Goals", "Season"]);
/// assert_eq!(table.rows[0], ["Arsenal", "88", "2022-2023"]);
/// ```
pub fn extract_table(markup: &str, season: &Season) -> Result<StatTable> {
    extract_table_with(markup, season, reconcile_trim_end)
}

/// Extract a table with a caller-chosen reconciliation policy.
pub fn extract_table_with(
    markup: &str,
    season: &Season,
    policy: ReconcilePolicy,
) -> Result<StatTable> {
    let document = Html::parse_document(markup);

    let table = document
        .select(&selector("table")?)
        .next()
        .ok_or_else(|| FbrefError::MalformedMarkup("No table found in the HTML content".to_string()))?;

    let labels = header_labels(&table)?;
    let rows = if has_body_tag(markup) {
        body_rows(&table)?
    } else {
        Vec::new()
    };

    let (labels, rows) = policy(labels, rows);
    Ok(stamp_season(labels, rows, season))
}

/// Labels of every header cell, `aria-label` first.
fn header_labels(table: &ElementRef) -> Result<Vec<String>> {
    let Some(thead) = table.select(&selector("thead")?).next() else {
        return Ok(Vec::new());
    };

    let th = selector("th")?;
    Ok(thead.select(&th).map(|cell| cell_label(&cell)).collect())
}

fn cell_label(cell: &ElementRef) -> String {
    match cell.value().attr("aria-label") {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => cell_text(cell),
    }
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn first_table_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table[\s>].*?(?:</table\s*>|$)").expect("table pattern is valid"))
}

fn tbody_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<tbody[\s>]").expect("tbody pattern is valid"))
}

/// Whether the first table of the source markup opens a `<tbody>`.
///
/// The HTML parser wraps bare `<tr>` children in a `<tbody>` of its own,
/// so the parsed tree cannot tell; rows only count when the source has one.
fn has_body_tag(markup: &str) -> bool {
    first_table_regex()
        .find(markup)
        .is_some_and(|table| tbody_regex().is_match(table.as_str()))
}

/// Trimmed cell texts of every body row.
fn body_rows(table: &ElementRef) -> Result<Vec<Vec<String>>> {
    let Some(tbody) = table.select(&selector("tbody")?).next() else {
        return Ok(Vec::new());
    };

    let tr = selector("tr")?;
    let cells = selector("th, td")?;

    Ok(tbody
        .select(&tr)
        .map(|row| row.select(&cells).map(|cell| cell_text(&cell)).collect())
        .collect())
}

/// Trim the longer of labels and values from the end.
///
/// The value width is the widest row; narrower rows are padded with empty
/// cells first. If values outnumber labels every row keeps its first
/// `labels.len()` cells, otherwise the labels are cut to the value width.
/// Leading cells are never dropped.
pub fn reconcile_trim_end(
    mut labels: Vec<String>,
    mut rows: Vec<Vec<String>>,
) -> (Vec<String>, Vec<Vec<String>>) {
    let value_width = rows.iter().map(Vec::len).max().unwrap_or(0);

    for row in &mut rows {
        row.resize(value_width, String::new());
    }

    if value_width > labels.len() {
        for row in &mut rows {
            row.truncate(labels.len());
        }
    } else if labels.len() > value_width {
        labels.truncate(value_width);
    }

    (labels, rows)
}

/// Add the season to every row.
///
/// An existing `Season` column is overwritten rather than duplicated.
fn stamp_season(mut labels: Vec<String>, mut rows: Vec<Vec<String>>, season: &Season) -> StatTable {
    match labels.iter().position(|l| l == SEASON_COLUMN) {
        Some(idx) => {
            for row in &mut rows {
                row[idx] = season.to_string();
            }
        }
        None => {
            labels.push(SEASON_COLUMN.to_string());
            for row in &mut rows {
                row.push(season.to_string());
            }
        }
    }

    StatTable::new(labels, rows)
}

//! Data types for the FBref scraper
//!
//! This module contains the core data structures used throughout the library:
//! seasons, statistical categories, and the season-stamped tables produced by
//! the extractor. All of them serialize for report and export output.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FbrefError, Result};

/// Name of the column stamped onto every extracted row
pub const SEASON_COLUMN: &str = "Season";

/// Seasons scraped when the caller does not pick any
pub const DEFAULT_SEASONS: [&str; 7] = [
    "2017-2018",
    "2018-2019",
    "2019-2020",
    "2020-2021",
    "2021-2022",
    "2022-2023",
    "2023-2024",
];

/// Season identifier of the form `YYYY-YYYY`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season(String);

fn season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{4})$").expect("season pattern is valid"))
}

impl Season {
    /// Parse and validate a season identifier.
    ///
    /// The second year must directly follow the first.
    ///
    /// # Examples
    /// ```
    /// use fbref_core::Season;
    ///
    /// assert!(Season::parse("2022-2023").is_ok());
    /// assert!(Season::parse("2022-2024").is_err());
    /// assert!(Season::parse("22-23").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let caps = season_regex()
            .captures(trimmed)
            .ok_or_else(|| FbrefError::InvalidSeason(raw.to_string()))?;

        let start: u32 = caps[1]
            .parse()
            .map_err(|_| FbrefError::InvalidSeason(raw.to_string()))?;
        let end: u32 = caps[2]
            .parse()
            .map_err(|_| FbrefError::InvalidSeason(raw.to_string()))?;

        if end != start + 1 {
            return Err(FbrefError::InvalidSeason(raw.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as it appears in URLs and file names
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The default season list, parsed
    pub fn defaults() -> Vec<Season> {
        DEFAULT_SEASONS.iter().map(|s| Season(s.to_string())).collect()
    }

    /// Parse a list of identifiers, failing on the first invalid one.
    pub fn parse_list<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Season>> {
        raw.iter().map(|s| Season::parse(s.as_ref())).collect()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Season {
    type Err = FbrefError;

    fn from_str(s: &str) -> Result<Self> {
        Season::parse(s)
    }
}

impl TryFrom<String> for Season {
    type Error = FbrefError;

    fn try_from(value: String) -> Result<Self> {
        Season::parse(&value)
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.0
    }
}

/// Statistical category published per season on FBref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Squad standard stats
    SquadStats,
    /// Squad wages
    Wages,
    /// Player standard stats
    Standard,
    /// Player defensive actions
    Defensive,
    /// Player passing
    Passing,
    /// Player shooting
    Shooting,
    /// Goalkeeping
    Goalkeeping,
}

impl Category {
    /// Every category, in the order a full run processes them
    pub const ALL: [Category; 7] = [
        Category::SquadStats,
        Category::Wages,
        Category::Standard,
        Category::Defensive,
        Category::Passing,
        Category::Shooting,
        Category::Goalkeeping,
    ];

    /// Name used on the command line and in serialized output
    pub fn name(self) -> &'static str {
        match self {
            Category::SquadStats => "squad-stats",
            Category::Wages => "wages",
            Category::Standard => "standard",
            Category::Defensive => "defensive",
            Category::Passing => "passing",
            Category::Shooting => "shooting",
            Category::Goalkeeping => "goalkeeping",
        }
    }

    /// Path segment between the season and the page slug
    pub fn url_path(self) -> &'static str {
        match self {
            Category::SquadStats => "stats/squads",
            Category::Wages => "wages",
            Category::Standard => "stats/players",
            Category::Defensive => "defense/players",
            Category::Passing => "passing/players",
            Category::Shooting => "shooting/players",
            Category::Goalkeeping => "keepers/players",
        }
    }

    /// Id of the element wrapping the category's table
    pub fn element_id(self) -> &'static str {
        match self {
            Category::SquadStats => "div_stats_teams_standard_for",
            Category::Wages => "div_squad_wages",
            Category::Standard => "div_stats_standard",
            Category::Defensive => "div_stats_defense",
            Category::Passing => "div_stats_passing",
            Category::Shooting => "div_stats_shooting",
            Category::Goalkeeping => "div_stats_keeper",
        }
    }

    /// Stem of staging and export file names
    pub fn file_stem(self) -> &'static str {
        match self {
            Category::SquadStats => "squad_stats",
            Category::Wages => "squad_wages",
            Category::Standard => "standard_stats",
            Category::Defensive => "defensive_stats",
            Category::Passing => "passing_stats",
            Category::Shooting => "shooting_stats",
            Category::Goalkeeping => "goalkeeping_stats",
        }
    }

    /// Page path for one season, relative to the site root
    ///
    /// # Examples
    /// ```
    /// use fbref_core::{Category, Season};
    ///
    /// let season = Season::parse("2022-2023").unwrap();
    /// assert_eq!(
    ///     Category::Passing.page_path(&season),
    ///     "/en/comps/Big5/2022-2023/passing/players/2022-2023-Big-5-European-Leagues-Stats"
    /// );
    /// ```
    pub fn page_path(self, season: &Season) -> String {
        format!(
            "/en/comps/Big5/{season}/{}/{season}-Big-5-European-Leagues-Stats",
            self.url_path()
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = FbrefError;

    /// Accepts the CLI name or the file stem.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.name() == wanted || c.file_stem() == wanted)
            .ok_or_else(|| FbrefError::UnknownCategory(s.to_string()))
    }
}

/// How a page is retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET
    #[default]
    Http,
    /// Headless Chrome, for tables rendered client-side
    Browser,
}

impl FetchMode {
    /// Extra file-name suffix that keeps browser-fetched files apart
    pub fn file_suffix(self) -> &'static str {
        match self {
            FetchMode::Http => "",
            FetchMode::Browser => "_selenium",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Http => f.write_str("http"),
            FetchMode::Browser => f.write_str("browser"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(FetchMode::Http),
            "browser" | "selenium" => Ok(FetchMode::Browser),
            other => Err(format!("unknown fetch mode '{other}' (expected http or browser)")),
        }
    }
}

/// Season-stamped table of string cells
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTable {
    /// Column labels, `Season` included
    pub columns: Vec<String>,
    /// Row cells in column order
    pub rows: Vec<Vec<String>>,
}

impl StatTable {
    /// Create a table, padding or cutting rows to the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Create a table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column with the given label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Cell by row index and column label
    pub fn get(&self, row: usize, label: &str) -> Option<&str> {
        let col = self.column_index(label)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Rows as label/value pairs in column order
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &str)>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect()
        })
    }

    /// Append the rows of another table.
    ///
    /// Columns are matched by label; the n-th occurrence of a repeated label
    /// matches the n-th occurrence on the other side. Labels only one side
    /// has are added at the end and filled with empty cells elsewhere.
    pub fn append(&mut self, other: StatTable) {
        let mut keys = occurrence_keys(&self.columns);
        let other_keys = occurrence_keys(&other.columns);

        let mut mapping = Vec::with_capacity(other_keys.len());
        for (idx, key) in other_keys.into_iter().enumerate() {
            match keys.iter().position(|k| *k == key) {
                Some(pos) => mapping.push(pos),
                None => {
                    self.columns.push(other.columns[idx].clone());
                    for row in &mut self.rows {
                        row.push(String::new());
                    }
                    keys.push(key);
                    mapping.push(self.columns.len() - 1);
                }
            }
        }

        let width = self.columns.len();
        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (value, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = value;
            }
            self.rows.push(aligned);
        }
    }
}

/// `(label, n)` for the n-th occurrence of each label
fn occurrence_keys(columns: &[String]) -> Vec<(String, usize)> {
    let mut keys: Vec<(String, usize)> = Vec::with_capacity(columns.len());
    for label in columns {
        let seen = keys.iter().filter(|(l, _)| l == label).count();
        keys.push((label.clone(), seen));
    }
    keys
}

/// Why a season contributed no rows to a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing staged for the season
    MissingStagedFile,
    /// Staged content holds no table
    MalformedMarkup(String),
    /// Staged file exists but could not be read
    ReadFailed(String),
}

/// Season left out of a category result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSkip {
    /// The season
    pub season: Season,
    /// What went wrong
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Merged tables of every season of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    /// The category
    pub category: Category,
    /// Rows of every extracted season, in processing order
    pub table: StatTable,
    /// Seasons that contributed a table
    pub seasons: Vec<Season>,
    /// Seasons that were left out
    pub skipped: Vec<SeasonSkip>,
}

impl CategoryResult {
    /// Create an empty result for a category
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            table: StatTable::empty(),
            seasons: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Whether no season produced any row
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

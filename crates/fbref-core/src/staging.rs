//! Staging directory for raw table markup
//!
//! The fetch stage writes one file per (category, season) and the parse
//! stage reads it back. File names follow `<stem>_<season>.txt`, with a
//! `_selenium` suffix before the extension for browser-fetched markup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FbrefError, Result};
use crate::types::{Category, FetchMode, Season};

/// Key/value store of staged markup on the local filesystem
#[derive(Debug, Clone)]
pub struct Staging {
    root: PathBuf,
}

impl Staging {
    /// Create a staging area rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name for a (category, season, mode) key
    ///
    /// # Examples
    /// ```
    /// use fbref_core::{Category, FetchMode, Season, Staging};
    ///
    /// let season = Season::parse("2022-2023").unwrap();
    /// assert_eq!(
    ///     Staging::file_name(Category::Shooting, &season, FetchMode::Browser),
    ///     "shooting_stats_2022-2023_selenium.txt"
    /// );
    /// ```
    pub fn file_name(category: Category, season: &Season, mode: FetchMode) -> String {
        format!("{}_{}{}.txt", category.file_stem(), season, mode.file_suffix())
    }

    /// Full path for a key
    pub fn path_for(&self, category: Category, season: &Season, mode: FetchMode) -> PathBuf {
        self.root.join(Self::file_name(category, season, mode))
    }

    /// Write markup for a key, replacing any previous content
    pub fn write(
        &self,
        category: Category,
        season: &Season,
        mode: FetchMode,
        markup: &str,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| FbrefError::io(&self.root, e))?;

        let path = self.path_for(category, season, mode);
        std::fs::write(&path, markup).map_err(|e| FbrefError::io(&path, e))?;
        debug!(path = %path.display(), bytes = markup.len(), "staged markup");

        Ok(path)
    }

    /// Read markup for a key
    ///
    /// # Returns
    /// * `Ok(Some(markup))` if the file exists
    /// * `Ok(None)` if nothing was staged for the key
    /// * `Err(FbrefError::Io)` if the file exists but cannot be read
    pub fn read(&self, category: Category, season: &Season, mode: FetchMode) -> Result<Option<String>> {
        let path = self.path_for(category, season, mode);
        match std::fs::read_to_string(&path) {
            Ok(markup) => Ok(Some(markup)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FbrefError::io(&path, e)),
        }
    }

    /// Whether markup is staged for a key
    pub fn contains(&self, category: Category, season: &Season, mode: FetchMode) -> bool {
        self.path_for(category, season, mode).is_file()
    }
}

impl Default for Staging {
    fn default() -> Self {
        Self::new("data_html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(raw: &str) -> Season {
        Season::parse(raw).unwrap()
    }

    #[test]
    fn test_file_names() {
        let s = season("2019-2020");
        assert_eq!(
            Staging::file_name(Category::SquadStats, &s, FetchMode::Http),
            "squad_stats_2019-2020.txt"
        );
        assert_eq!(
            Staging::file_name(Category::Wages, &s, FetchMode::Http),
            "squad_wages_2019-2020.txt"
        );
        assert_eq!(
            Staging::file_name(Category::Goalkeeping, &s, FetchMode::Browser),
            "goalkeeping_stats_2019-2020_selenium.txt"
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("nested"));
        let s = season("2022-2023");

        let path = staging
            .write(Category::Passing, &s, FetchMode::Http, "<table></table>")
            .unwrap();

        assert!(path.ends_with("passing_stats_2022-2023.txt"));
        assert!(staging.contains(Category::Passing, &s, FetchMode::Http));
        assert!(!staging.contains(Category::Passing, &s, FetchMode::Browser));
        assert_eq!(
            staging.read(Category::Passing, &s, FetchMode::Http).unwrap().as_deref(),
            Some("<table></table>")
        );
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let result = staging
            .read(Category::Defensive, &season("2017-2018"), FetchMode::Http)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let s = season("2020-2021");

        staging.write(Category::Standard, &s, FetchMode::Http, "old").unwrap();
        staging.write(Category::Standard, &s, FetchMode::Http, "new").unwrap();

        assert_eq!(
            staging.read(Category::Standard, &s, FetchMode::Http).unwrap().as_deref(),
            Some("new")
        );
    }
}

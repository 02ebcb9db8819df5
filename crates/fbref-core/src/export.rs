//! Export of category results to CSV or JSON files

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::{FbrefError, Result};
use crate::types::{CategoryResult, StatTable};

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{other}' (expected csv or json)")),
        }
    }
}

/// Write a table as CSV with the column labels as header
pub fn write_csv(table: &StatTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| FbrefError::io(path, e))
}

/// Write a table as a JSON array of objects, keys in column order.
///
/// Repeated labels get a `.N` suffix from their second occurrence on, so
/// no cell is lost to a duplicate key.
pub fn write_json(table: &StatTable, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, &JsonRows::new(table))?;
    writer.flush().map_err(|e| FbrefError::io(path, e))
}

/// Write every non-empty result to `<out_dir>/<stem>.<ext>`
///
/// # Returns
/// Paths of the files written, in result order
pub fn export_results(results: &[CategoryResult], out_dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for result in results {
        if result.is_empty() {
            info!(category = %result.category, "No rows, nothing exported");
            continue;
        }

        let path = out_dir.join(format!("{}.{}", result.category.file_stem(), format.extension()));
        match format {
            ExportFormat::Csv => write_csv(&result.table, &path)?,
            ExportFormat::Json => write_json(&result.table, &path)?,
        }
        info!(category = %result.category, rows = result.table.len(), "Exported {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FbrefError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| FbrefError::io(path, e))?;
    Ok(BufWriter::new(file))
}

struct JsonRows<'a> {
    keys: Vec<String>,
    rows: &'a [Vec<String>],
}

impl<'a> JsonRows<'a> {
    fn new(table: &'a StatTable) -> Self {
        let mut keys: Vec<String> = Vec::with_capacity(table.columns.len());
        for (idx, label) in table.columns.iter().enumerate() {
            let seen = table.columns[..idx].iter().filter(|l| *l == label).count();
            keys.push(if seen == 0 {
                label.clone()
            } else {
                format!("{label}.{seen}")
            });
        }
        Self {
            keys,
            rows: &table.rows,
        }
    }
}

struct JsonRow<'a> {
    keys: &'a [String],
    cells: &'a [String],
}

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&JsonRow {
                keys: &self.keys,
                cells: row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, cell) in self.keys.iter().zip(self.cells) {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

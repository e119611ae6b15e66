//! CSV persistence for festival tables

use super::{columns, ArtistRecord, Table};
use lineup_common::config::TablePaths;
use lineup_common::{Error, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Festival-year table identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    pub festival: String,
    pub year: u16,
}

impl TableId {
    pub fn new(festival: &str, year: u16) -> Self {
        Self {
            festival: festival.to_string(),
            year,
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.festival, self.year)
    }
}

/// Whole-table CSV load/save
///
/// `save` rewrites the complete file. Callers must pass the full row set
/// obtained from `load` in the same pass, or rows are lost.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_root: PathBuf,
}

impl RecordStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn table_path(&self, id: &TableId) -> PathBuf {
        TablePaths::new(&self.data_root, &id.festival, id.year).table
    }

    /// Load a table
    ///
    /// # Errors
    /// `Error::NotFound` if the CSV does not exist; `Error::Csv` if it cannot be parsed.
    pub fn load(&self, id: &TableId) -> Result<Table> {
        let path = self.table_path(id);
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "CSV file not found for {}: {}",
                id,
                path.display()
            )));
        }
        let table = read_table(&path)?;
        info!(table = %id, rows = table.len(), columns = table.fieldnames.len(), "Loaded table");
        Ok(table)
    }

    /// Save a table, replacing the file atomically
    pub fn save(&self, id: &TableId, table: &Table) -> Result<()> {
        let path = self.table_path(id);
        write_table(&path, table)?;
        info!(table = %id, rows = table.len(), "Saved table");
        Ok(())
    }
}

/// Read a CSV into a [`Table`], preserving header order
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let fieldnames: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: HashMap<String, String> = fieldnames
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(ArtistRecord::from_fields(fields));
    }

    let table = Table { fieldnames, rows };
    check_artist_keys(&table, path);
    Ok(table)
}

/// Write a [`Table`] via a temp file + rename
///
/// Cells set on rows under a column missing from the header are kept by
/// appending that column.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let known: HashSet<&str> = table.fieldnames.iter().map(String::as_str).collect();
    let extra: BTreeSet<&str> = table
        .rows
        .iter()
        .flat_map(|r| r.non_empty_fields().map(|(k, _)| k))
        .filter(|k| !known.contains(k))
        .collect();
    if !extra.is_empty() {
        warn!(columns = ?extra, "Appending columns missing from header");
    }

    let header: Vec<&str> = table
        .fieldnames
        .iter()
        .map(String::as_str)
        .chain(extra.iter().copied())
        .collect();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(&header)?;
        for row in &table.rows {
            writer.write_record(header.iter().map(|c| row.get(c)))?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "Table written");
    Ok(())
}

fn check_artist_keys(table: &Table, path: &Path) {
    if !table.has_column(columns::ARTIST) {
        warn!(path = %path.display(), "Table has no Artist column");
        return;
    }
    let mut seen = HashSet::new();
    for (i, row) in table.rows.iter().enumerate() {
        let name = row.artist_name().to_lowercase();
        if name.is_empty() {
            warn!(row = i + 2, "Row without artist name");
        } else if !seen.insert(name) {
            warn!(row = i + 2, artist = %row.artist_name(), "Duplicate artist row");
        }
    }
}

//! In-memory festival table

use super::{columns, ArtistRecord};

/// Header plus rows of one festival-year CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column order exactly as read (plus appended columns)
    pub fieldnames: Vec<String>,
    pub rows: Vec<ArtistRecord>,
}

impl Table {
    /// Empty table with the standard column set
    pub fn with_standard_columns() -> Self {
        Self {
            fieldnames: columns::STANDARD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append `column` to the header if it is not already present
    ///
    /// Returns true if the header changed.
    pub fn ensure_column(&mut self, column: &str) -> bool {
        if self.fieldnames.iter().any(|f| f == column) {
            return false;
        }
        self.fieldnames.push(column.to_string());
        true
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fieldnames.iter().any(|f| f == column)
    }

    /// Index of the first row whose artist name matches (case-insensitive)
    pub fn position(&self, artist_name: &str) -> Option<usize> {
        let needle = artist_name.trim().to_lowercase();
        self.rows
            .iter()
            .position(|r| r.artist_name().to_lowercase() == needle)
    }

    pub fn find(&self, artist_name: &str) -> Option<&ArtistRecord> {
        self.position(artist_name).map(|i| &self.rows[i])
    }

    pub fn find_mut(&mut self, artist_name: &str) -> Option<&mut ArtistRecord> {
        self.position(artist_name).map(move |i| &mut self.rows[i])
    }

    pub fn contains_artist(&self, artist_name: &str) -> bool {
        self.position(artist_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

//! One artist row

use super::columns;
use std::collections::{BTreeMap, HashMap};

/// One row of the festival table, keyed by `Artist`
///
/// Values are stored as text under their column name. A missing column
/// and an empty cell both mean "not yet known". Columns the code does not
/// know about are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistRecord {
    fields: HashMap<String, String>,
}

impl ArtistRecord {
    /// New row with only the artist name set
    pub fn new(artist_name: &str) -> Self {
        let mut record = Self::default();
        record.set(columns::ARTIST, artist_name);
        record
    }

    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn artist_name(&self) -> &str {
        self.get(columns::ARTIST).trim()
    }

    /// Cell value, `""` if the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.fields.insert(column.to_string(), value.into());
    }

    /// True if the cell is absent or whitespace-only
    pub fn is_empty(&self, column: &str) -> bool {
        self.get(column).trim().is_empty()
    }

    /// Festival bio preferring English, falling back to Dutch
    pub fn festival_bio(&self) -> Option<&str> {
        [columns::FESTIVAL_BIO_EN, columns::FESTIVAL_BIO_NL]
            .into_iter()
            .map(|c| self.get(c).trim())
            .find(|bio| !bio.is_empty())
    }

    /// `Social Links` decoded from its JSON cell; malformed JSON reads as empty
    pub fn social_links(&self) -> BTreeMap<String, String> {
        let raw = self.get(columns::SOCIAL_LINKS).trim();
        if raw.is_empty() {
            return BTreeMap::new();
        }
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Iterate over non-empty cells
    pub fn non_empty_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

//! ProvenanceTracker: who last supplied a protected field
//!
//! Sidecar JSON next to the table:
//!
//! ```json
//! {
//!   "user_edits": {
//!     "Bicep": { "AI Rating": "9", "AI Summary": { "value": "...", "source": "ai" } }
//!   },
//!   "last_updated": "2026-03-01T12:00:00Z"
//! }
//! ```
//!
//! A plain string is a user-owned value. Automated writes are recorded
//! with their source and never block later writes. [`ProvenanceTracker::track`]
//! promotes every non-empty protected value to user ownership, whatever
//! wrote it: the table cannot tell a hand edit from an earlier automated
//! run, so anything present at tracking time is treated as the user's.

use crate::records::ArtistRecord;
use lineup_common::files::write_json_atomically;
use lineup_common::{time, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Origin of a recorded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    User,
    Ai,
    Scrape,
}

/// Last known value of one (artist, field)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEntry", into = "StoredEntry")]
pub struct ProvenanceEntry {
    pub value: String,
    pub source: Source,
}

/// On-disk shape: user entries stay plain strings
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    User(String),
    Sourced { value: String, source: Source },
}

impl From<StoredEntry> for ProvenanceEntry {
    fn from(stored: StoredEntry) -> Self {
        match stored {
            StoredEntry::User(value) => Self {
                value,
                source: Source::User,
            },
            StoredEntry::Sourced { value, source } => Self { value, source },
        }
    }
}

impl From<ProvenanceEntry> for StoredEntry {
    fn from(entry: ProvenanceEntry) -> Self {
        match entry.source {
            Source::User => StoredEntry::User(entry.value),
            source => StoredEntry::Sourced {
                value: entry.value,
                source,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct ProvenanceFile {
    #[serde(default)]
    user_edits: BTreeMap<String, BTreeMap<String, ProvenanceEntry>>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Per-table provenance store
///
/// Loaded whole at pass start, saved whole at pass end if anything changed.
#[derive(Debug)]
pub struct ProvenanceTracker {
    path: PathBuf,
    protected: Vec<String>,
    entries: BTreeMap<String, BTreeMap<String, ProvenanceEntry>>,
    dirty: bool,
}

impl ProvenanceTracker {
    /// Empty tracker (nothing persisted yet)
    pub fn new(path: impl Into<PathBuf>, protected_fields: &[String]) -> Self {
        Self {
            path: path.into(),
            protected: protected_fields.to_vec(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the sidecar; a missing file yields an empty tracker
    ///
    /// # Errors
    /// Unreadable or malformed sidecar; it is never replaced by an empty one.
    pub fn load(path: impl Into<PathBuf>, protected_fields: &[String]) -> Result<Self> {
        let mut tracker = Self::new(path, protected_fields);
        if tracker.path.exists() {
            let content = std::fs::read_to_string(&tracker.path)?;
            let file: ProvenanceFile = serde_json::from_str(&content)?;
            tracker.entries = file.user_edits;
            debug!(
                path = %tracker.path.display(),
                artists = tracker.entries.len(),
                "Loaded provenance"
            );
        }
        Ok(tracker)
    }

    pub fn is_protected(&self, field: &str) -> bool {
        self.protected.iter().any(|f| f == field)
    }

    /// Record every non-empty protected value as user-owned
    ///
    /// Returns the number of entries created or changed.
    pub fn track(&mut self, rows: &[ArtistRecord]) -> usize {
        let mut changed = 0;
        for row in rows {
            let artist = row.artist_name();
            if artist.is_empty() {
                continue;
            }
            for field in &self.protected {
                let value = row.get(field).trim();
                if value.is_empty() {
                    continue;
                }
                let entry = ProvenanceEntry {
                    value: value.to_string(),
                    source: Source::User,
                };
                let fields = self.entries.entry(artist.to_string()).or_default();
                if fields.get(field) != Some(&entry) {
                    debug!(artist = %artist, field = %field, "Tracking user value");
                    fields.insert(field.clone(), entry);
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.dirty = true;
            info!(entries = changed, "Tracked protected values");
        }
        changed
    }

    /// True if a user-sourced entry exists for (artist, field)
    pub fn is_user_owned(&self, artist: &str, field: &str) -> bool {
        self.entry(artist, field)
            .is_some_and(|e| e.source == Source::User)
    }

    pub fn entry(&self, artist: &str, field: &str) -> Option<&ProvenanceEntry> {
        self.entries.get(artist.trim()).and_then(|f| f.get(field))
    }

    /// Record an automated write; user-owned entries are left alone
    pub fn record_automated(&mut self, artist: &str, field: &str, value: &str, source: Source) {
        if source == Source::User || self.is_user_owned(artist, field) {
            return;
        }
        let entry = ProvenanceEntry {
            value: value.to_string(),
            source,
        };
        let fields = self.entries.entry(artist.trim().to_string()).or_default();
        if fields.get(field) != Some(&entry) {
            fields.insert(field.to_string(), entry);
            self.dirty = true;
        }
    }

    /// Put stored user values back into rows whose cell is empty
    ///
    /// Returns the number of cells restored.
    pub fn restore_user_values(&self, rows: &mut [ArtistRecord]) -> usize {
        let mut restored = 0;
        for row in rows.iter_mut() {
            let Some(fields) = self.entries.get(row.artist_name()) else {
                continue;
            };
            for (field, entry) in fields {
                if entry.source == Source::User && row.is_empty(field) {
                    row.set(field, entry.value.clone());
                    restored += 1;
                }
            }
        }
        if restored > 0 {
            info!(cells = restored, "Restored user values");
        }
        restored
    }

    /// Write the sidecar if anything changed since load
    ///
    /// Returns true if a write happened.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let file = ProvenanceFile {
            user_edits: self.entries.clone(),
            last_updated: Some(time::now_rfc3339()),
        };
        write_json_atomically(&self.path, &file)?;
        self.dirty = false;
        info!(path = %self.path.display(), "Saved provenance");
        Ok(true)
    }
}

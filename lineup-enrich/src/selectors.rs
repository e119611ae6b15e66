//! SelectorStore: CSS selectors learned per site
//!
//! File format (`learned_selectors.json`):
//!
//! ```json
//! {
//!   "down-the-rabbit-hole": {
//!     "bio_selector": "div.column.prose",
//!     "bio_learned_at": "2026-02-11T20:14:03Z"
//!   }
//! }
//! ```
//!
//! Entries are never evicted. A selector that stops matching stays in the
//! file and is only replaced by a confirmed relearn.

use crate::extraction::SemanticField;
use lineup_common::files::write_json_atomically;
use lineup_common::{time, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Learned selector for one (site, field)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub selector: String,
    pub learned_at: Option<String>,
}

/// Persistent site → field → selector map
#[derive(Debug)]
pub struct SelectorStore {
    path: PathBuf,
    sites: BTreeMap<String, BTreeMap<String, String>>,
    learned_this_session: usize,
}

impl SelectorStore {
    /// Empty store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sites: BTreeMap::new(),
            learned_this_session: 0,
        }
    }

    /// Load the store; a missing file yields an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        if store.path.exists() {
            let content = std::fs::read_to_string(&store.path)?;
            store.sites = serde_json::from_str(&content)?;
            debug!(path = %store.path.display(), sites = store.sites.len(), "Loaded learned selectors");
        }
        Ok(store)
    }

    pub fn get(&self, site_id: &str, field: SemanticField) -> Option<&str> {
        self.sites
            .get(site_id)
            .and_then(|fields| fields.get(&field.selector_key()))
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn entry(&self, site_id: &str, field: SemanticField) -> Option<SelectorEntry> {
        let selector = self.get(site_id, field)?.to_string();
        let learned_at = self
            .sites
            .get(site_id)
            .and_then(|fields| fields.get(&field.learned_at_key()))
            .cloned();
        Some(SelectorEntry {
            selector,
            learned_at,
        })
    }

    /// Store a confirmed selector, replacing any previous one
    pub fn put(&mut self, site_id: &str, field: SemanticField, selector: &str) {
        let fields = self.sites.entry(site_id.to_string()).or_default();
        fields.insert(field.selector_key(), selector.to_string());
        fields.insert(field.learned_at_key(), time::now_rfc3339());
        self.learned_this_session += 1;
        info!(site = %site_id, field = %field, selector = %selector, "Learned selector");
    }

    /// Selectors learned since load
    pub fn learned_this_session(&self) -> usize {
        self.learned_this_session
    }

    /// Write the store only if a selector was learned this session
    ///
    /// Returns true if a write happened.
    pub fn save_if_learned(&mut self) -> Result<bool> {
        if self.learned_this_session == 0 {
            return Ok(false);
        }
        write_json_atomically(&self.path, &self.sites)?;
        info!(
            path = %self.path.display(),
            learned = self.learned_this_session,
            "Saved learned selectors"
        );
        self.learned_this_session = 0;
        Ok(true)
    }
}

//! Table, tracker and page fixtures

use async_trait::async_trait;
use lineup_common::config::{builtin_festivals, DEFAULT_FESTIVAL, DEFAULT_PROTECTED_FIELDS};
use lineup_common::FestivalConfig;
use lineup_enrich::fetch::PageSource;
use lineup_enrich::provenance::ProvenanceTracker;
use lineup_enrich::records::{ArtistRecord, Table};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Built-in default festival
pub fn festival() -> FestivalConfig {
    builtin_festivals()
        .remove(DEFAULT_FESTIVAL)
        .expect("default festival is built in")
}

/// Row from (column, value) pairs
pub fn row(artist: &str, cells: &[(&str, &str)]) -> ArtistRecord {
    let mut record = ArtistRecord::new(artist);
    for (column, value) in cells {
        record.set(column, *value);
    }
    record
}

/// Standard-column table holding `rows`
pub fn table(rows: Vec<ArtistRecord>) -> Table {
    let mut table = Table::with_standard_columns();
    table.rows = rows;
    table
}

/// Tracker with the default protected fields, persisted under `dir`
pub fn tracker(dir: &Path) -> ProvenanceTracker {
    let protected: Vec<String> = DEFAULT_PROTECTED_FIELDS.iter().map(|f| f.to_string()).collect();
    ProvenanceTracker::new(dir.join("provenance.json"), &protected)
}

/// In-memory pages keyed by URL, recording every request
#[derive(Default)]
pub struct MapSource {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl MapSource {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MapSource {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned()
    }
}

//! Lineup sync: add newly announced artists to the table
//!
//! Tracks user values first, scrapes the lineup page for artist links,
//! appends rows for unknown artists (name and festival URL only) and puts
//! back any protected user value whose cell was lost.

use crate::extraction::{ExtractionContext, ExtractionEngine, Link, Page, SemanticField};
use crate::fetch::PageSource;
use crate::provenance::ProvenanceTracker;
use crate::records::{columns, ArtistRecord, Table};
use crate::selectors::SelectorStore;
use lineup_common::FestivalConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Tab and navigation labels that link into the artist path
const NAVIGATION_LABELS: [&str; 14] = [
    "Overview",
    "Friday",
    "FridayFri",
    "Friday Fri",
    "Saturday",
    "SaturdaySat",
    "Saturday Sat",
    "Sunday",
    "SundaySun",
    "Sunday Sun",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
];

/// Link texts that are a day badge, not a name; the name comes from the URL
const DAY_BADGES: [&str; 8] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun", "Multiple acts"];

static DAY_DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s+(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+\d+\s+(January|February|March|April|May|June|July|August|September|October|November|December)$",
    )
    .expect("valid regex")
});

/// Artist found on the lineup page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupEntry {
    pub name: String,
    pub url: String,
}

/// Sync totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Protected values newly tracked
    pub tracked: usize,
    /// Artists on the lineup page
    pub found: usize,
    /// Rows appended
    pub added: usize,
    /// User values put back into emptied cells
    pub restored: usize,
}

impl SyncSummary {
    /// True if the table must be saved
    pub fn table_changed(&self) -> bool {
        self.added > 0 || self.restored > 0
    }
}

/// `jack-white` → `Jack White`
fn name_from_url(href: &str) -> String {
    let slug = href.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Turn lineup links into artist entries
///
/// Navigation tabs are dropped, day badges are replaced by a name derived
/// from the URL, trailing "Fri 26 June" style suffixes are removed and
/// duplicate URLs are collapsed.
pub fn entries_from_links(links: &[Link]) -> Vec<LineupEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for link in links {
        let text = link.text.trim();
        if NAVIGATION_LABELS.contains(&text) {
            continue;
        }
        let name = if DAY_BADGES.contains(&text) || text.is_empty() {
            name_from_url(&link.href)
        } else {
            text.to_string()
        };
        let name = DAY_DATE_SUFFIX.replace(&name, "").trim().to_string();

        if !name.is_empty() && seen.insert(link.href.clone()) {
            entries.push(LineupEntry {
                name,
                url: link.href.clone(),
            });
        }
    }
    entries
}

/// Scrape the festival's lineup page
///
/// Empty if the page cannot be fetched or no tier finds artist links.
pub async fn scrape_lineup(
    source: &dyn PageSource,
    engine: &mut ExtractionEngine,
    selectors: &mut SelectorStore,
    festival: &FestivalConfig,
) -> Vec<LineupEntry> {
    let Some(html) = source.fetch(&festival.lineup_url).await else {
        warn!(url = %festival.lineup_url, "Lineup page unavailable");
        return Vec::new();
    };

    let ctx = ExtractionContext {
        base_url: festival.base_url.clone(),
        artist_path: festival.artist_path.clone(),
        artist_name: None,
        page_url: Some(festival.lineup_url.clone()),
    };
    let page = Page::parse(&html);
    let links = engine
        .extract(selectors, &page, SemanticField::LineupLinks, festival.site_id(), &ctx)
        .map(|e| e.value.into_links())
        .unwrap_or_default();

    let entries = entries_from_links(&links);
    info!(festival = %festival.name, artists = entries.len(), "Scraped lineup");
    entries
}

/// Append `entries` not yet in `table`; returns the number added
pub fn add_new_artists(table: &mut Table, entries: &[LineupEntry]) -> usize {
    table.ensure_column(columns::FESTIVAL_URL);
    let mut added = 0;
    for entry in entries {
        if table.contains_artist(&entry.name) {
            continue;
        }
        let mut row = ArtistRecord::new(&entry.name);
        row.set(columns::FESTIVAL_URL, entry.url.clone());
        debug!(artist = %entry.name, "New artist");
        table.rows.push(row);
        added += 1;
    }
    added
}

/// Full sync over an already loaded table
pub async fn sync_lineup(
    table: &mut Table,
    provenance: &mut ProvenanceTracker,
    selectors: &mut SelectorStore,
    engine: &mut ExtractionEngine,
    source: &dyn PageSource,
    festival: &FestivalConfig,
) -> SyncSummary {
    let mut summary = SyncSummary {
        tracked: provenance.track(&table.rows),
        ..Default::default()
    };

    let entries = scrape_lineup(source, engine, selectors, festival).await;
    summary.found = entries.len();
    summary.added = add_new_artists(table, &entries);
    summary.restored = provenance.restore_user_values(&mut table.rows);

    if summary.added > 0 {
        info!(added = summary.added, "Added new artists");
    } else {
        info!("No new artists");
    }
    summary
}

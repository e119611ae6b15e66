//! Festival data scrape: bio, social links and Spotify link per artist page
//!
//! Pages are fetched one after another through a [`PageSource`]. Results
//! go through the same merge rules as provider output, recorded with
//! source `scrape`.

use crate::ai::prompt::translation_prompt;
use crate::ai::EnrichmentProvider;
use crate::extraction::social::categorize;
use crate::extraction::{ExtractionContext, ExtractionEngine, Page, SemanticField};
use crate::fetch::PageSource;
use crate::merge::engine::{merge_into_table, ArtistProposal, MergePolicy};
use crate::provenance::{ProvenanceTracker, Source};
use crate::records::columns::{self, FESTIVAL_DATA_FIELDS};
use crate::records::values::SPOTIFY_ARTIST_RE;
use crate::records::{ArtistRecord, Table};
use crate::selectors::SelectorStore;
use lineup_common::{artist_slug, BioLanguage, FestivalConfig};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Options for one scrape pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Re-scrape rows that already have festival data
    pub force: bool,
    /// Only this artist (case-insensitive)
    pub artist_filter: Option<String>,
}

/// Scrape totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Pages fetched and parsed
    pub scraped: usize,
    /// Rows with at least one field written
    pub updated: usize,
    /// Pages that could not be fetched
    pub unavailable: usize,
    /// Rows that already had festival data
    pub skipped: usize,
    pub fields_changed: usize,
}

impl ScrapeSummary {
    pub fn has_changes(&self) -> bool {
        self.fields_changed > 0
    }
}

/// What one artist page yielded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedArtist {
    pub bio: Option<String>,
    /// Platform → URL
    pub social_links: BTreeMap<String, String>,
    pub spotify_link: Option<String>,
}

/// Row qualifies for scraping
pub fn needs_festival_data(row: &ArtistRecord, force: bool) -> bool {
    force || FESTIVAL_DATA_FIELDS.iter().any(|f| row.is_empty(f))
}

/// Artist page URL: the stored one, else derived from the slug
pub fn artist_page_url(row: &ArtistRecord, festival: &FestivalConfig) -> String {
    let stored = row.get(columns::FESTIVAL_URL).trim();
    if stored.is_empty() {
        festival.artist_url(&artist_slug(row.artist_name()))
    } else {
        stored.to_string()
    }
}

/// Run the extraction tiers over one artist page
pub fn scrape_artist_page(
    html: &str,
    engine: &mut ExtractionEngine,
    selectors: &mut SelectorStore,
    site_id: &str,
    ctx: &ExtractionContext,
) -> ScrapedArtist {
    let page = Page::parse(html);
    let bio = engine
        .extract(selectors, &page, SemanticField::Bio, site_id, ctx)
        .and_then(|e| e.value.into_text());
    let social_links = engine
        .extract(selectors, &page, SemanticField::SocialLinks, site_id, ctx)
        .map(|e| categorize(&e.value.into_links()))
        .unwrap_or_default();
    let spotify_link = SPOTIFY_ARTIST_RE.find(html).map(|m| m.as_str().to_string());

    ScrapedArtist {
        bio,
        social_links,
        spotify_link,
    }
}

/// Translate `text`; `None` on any provider failure or empty reply
pub async fn translate(
    provider: &dyn EnrichmentProvider,
    text: &str,
    from: &str,
    to: &str,
) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    match provider.enrich(&translation_prompt(text, from, to)).await {
        Ok(reply) => {
            let translated = reply.trim().trim_matches('"').trim();
            (!translated.is_empty()).then(|| translated.to_string())
        }
        Err(e) => {
            warn!(error = %e, "Translation failed");
            None
        }
    }
}

/// Column candidates for a scraped page
///
/// A Dutch bio goes to `Festival Bio (NL)` with its translation (if any)
/// in `Festival Bio (EN)`; an English bio goes to `Festival Bio (EN)`.
pub fn candidates(
    url: &str,
    scraped: &ScrapedArtist,
    language: BioLanguage,
    translation: Option<String>,
) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert(columns::FESTIVAL_URL.to_string(), url.to_string());

    if let Some(bio) = &scraped.bio {
        match language {
            BioLanguage::Dutch => {
                values.insert(columns::FESTIVAL_BIO_NL.to_string(), bio.clone());
                if let Some(english) = translation {
                    values.insert(columns::FESTIVAL_BIO_EN.to_string(), english);
                }
            }
            BioLanguage::English => {
                values.insert(columns::FESTIVAL_BIO_EN.to_string(), bio.clone());
            }
        }
    }
    if !scraped.social_links.is_empty() {
        if let Ok(json) = serde_json::to_string(&scraped.social_links) {
            values.insert(columns::SOCIAL_LINKS.to_string(), json);
        }
    }
    if let Some(spotify) = &scraped.spotify_link {
        values.insert(columns::SPOTIFY_LINK.to_string(), spotify.clone());
    }
    values
}

/// Scrape festival data for every qualifying row
///
/// `translator` translates Dutch bios; without one the English column is
/// left for a later run.
#[allow(clippy::too_many_arguments)]
pub async fn scrape_festival_data(
    table: &mut Table,
    provenance: &mut ProvenanceTracker,
    selectors: &mut SelectorStore,
    engine: &mut ExtractionEngine,
    source: &dyn PageSource,
    translator: Option<&dyn EnrichmentProvider>,
    festival: &FestivalConfig,
    options: &ScrapeOptions,
) -> ScrapeSummary {
    let mut summary = ScrapeSummary::default();
    let filter = options
        .artist_filter
        .as_deref()
        .map(|a| a.trim().to_lowercase());

    let mut targets = Vec::new();
    for row in &table.rows {
        let artist = row.artist_name();
        if artist.is_empty() || filter.as_deref().is_some_and(|f| artist.to_lowercase() != f) {
            continue;
        }
        if needs_festival_data(row, options.force) {
            let wants_english = options.force || row.is_empty(columns::FESTIVAL_BIO_EN);
            targets.push((artist.to_string(), artist_page_url(row, festival), wants_english));
        } else {
            summary.skipped += 1;
        }
    }

    info!(artists = targets.len(), festival = %festival.name, "Scraping festival data");
    for column in [columns::FESTIVAL_URL, columns::FESTIVAL_BIO_NL, columns::FESTIVAL_BIO_EN, columns::SOCIAL_LINKS] {
        table.ensure_column(column);
    }

    let policy = MergePolicy {
        force: options.force,
        rating_boost: 0.0,
        source: Source::Scrape,
    };

    for (index, (artist, url, wants_english)) in targets.iter().enumerate() {
        debug!(artist = %artist, url = %url, progress = index + 1, total = targets.len(), "Fetching artist page");
        let Some(html) = source.fetch(url).await else {
            summary.unavailable += 1;
            continue;
        };

        let ctx = ExtractionContext {
            base_url: festival.base_url.clone(),
            artist_path: festival.artist_path.clone(),
            artist_name: Some(artist.clone()),
            page_url: Some(url.clone()),
        };
        let scraped = scrape_artist_page(&html, engine, selectors, festival.site_id(), &ctx);
        summary.scraped += 1;

        // A filled English bio would be kept anyway without force
        let translation = match (&scraped.bio, festival.bio_language, translator) {
            (Some(bio), BioLanguage::Dutch, Some(provider)) if *wants_english => {
                translate(provider, bio, "Dutch", "English").await
            }
            _ => None,
        };

        let proposal = ArtistProposal {
            artist: artist.clone(),
            values: candidates(url, &scraped, festival.bio_language, translation),
            fallback: None,
        };
        match merge_into_table(table, &proposal, provenance, &policy) {
            Some(changes) if !changes.is_empty() => {
                info!(artist = %artist, fields = changes.len(), "Festival data updated");
                summary.updated += 1;
                summary.fields_changed += changes.len();
            }
            _ => debug!(artist = %artist, "No festival data written"),
        }
    }

    info!(
        scraped = summary.scraped,
        updated = summary.updated,
        unavailable = summary.unavailable,
        skipped = summary.skipped,
        "Festival data scrape complete"
    );
    summary
}

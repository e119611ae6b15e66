//! Pass lifecycle against a real data directory
//!
//! sync-lineup → scrape → enrich over one festival-year, with pages served
//! from memory and a scripted provider.

mod helpers;

use helpers::{festival, row, MapSource, MockProvider};
use lineup_common::config::DEFAULT_PROTECTED_FIELDS;
use lineup_common::Error;
use lineup_enrich::ai::EnrichmentProvider;
use lineup_enrich::extraction::{ExtractionEngine, NullResolver};
use lineup_enrich::festival_data::ScrapeOptions;
use lineup_enrich::merge::engine::FESTIVAL_BIO_DISCLAIMER;
use lineup_enrich::merge::BatchOptions;
use lineup_enrich::records::columns::{
    AI_RATING, AI_SUMMARY, BIO, FESTIVAL_BIO_EN, FESTIVAL_BIO_NL, FESTIVAL_URL, GENRE,
    SOCIAL_LINKS, SPOTIFY_LINK,
};
use lineup_enrich::records::{RecordStore, Table, TableId};
use lineup_enrich::Pipeline;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const YEAR: u16 = 2026;
const LINEUP_URL: &str = "https://downtherabbithole.nl/programma";
const WET_LEG_URL: &str = "https://downtherabbithole.nl/programma/wet-leg";

const LINEUP_PAGE: &str = r#"<html><body>
  <nav><a href="/programma/overview">Overview</a><a href="/programma/friday">Friday</a></nav>
  <ul>
    <li><a href="/programma/jack-white">Jack White</a></li>
    <li><a href="/programma/wet-leg">Fri</a></li>
  </ul>
</body></html>"#;

const WET_LEG_BIO_NL: &str = "Wet Leg is het indierockduo van Rhian Teasdale en Hester Chambers van het Isle of Wight.";

fn wet_leg_page() -> String {
    format!(
        r#"<html><body><h1>Wet Leg</h1>
        <div class="column text-xl font-normal prose"><p>{}</p></div>
        <div class="border p-8 mt-8">
          <a target="_blank" href="https://open.spotify.com/artist/2TwOrUcYnAlIiKmVQkkoSZ">Spotify</a>
          <a target="_blank" href="https://www.instagram.com/wetlegband">Instagram</a>
        </div></body></html>"#,
        WET_LEG_BIO_NL
    )
}

fn pipeline(root: &Path) -> Pipeline {
    let protected = DEFAULT_PROTECTED_FIELDS.iter().map(|f| f.to_string()).collect();
    Pipeline::new(root, festival(), YEAR, protected)
}

fn store(root: &Path) -> (RecordStore, TableId) {
    (RecordStore::new(root), TableId::new(&festival().slug, YEAR))
}

fn seed(root: &Path, rows: Vec<lineup_enrich::records::ArtistRecord>) {
    let mut table = Table::with_standard_columns();
    table.rows = rows;
    let (store, id) = store(root);
    store.save(&id, &table).unwrap();
}

fn reload(root: &Path) -> Table {
    let (store, id) = store(root);
    store.load(&id).unwrap()
}

fn engine() -> ExtractionEngine {
    ExtractionEngine::new(Box::new(NullResolver))
}

#[test]
fn test_missing_table_is_reported() {
    let dir = TempDir::new().unwrap();

    let result = pipeline(dir.path()).track();

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_track_writes_sidecar() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Jack White", &[(AI_RATING, "8"), (GENRE, "Blues rock")])]);
    let pipeline = pipeline(dir.path());

    assert_eq!(pipeline.track().unwrap(), 1);
    assert_eq!(pipeline.track().unwrap(), 0);

    let sidecar: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&pipeline.paths().provenance).unwrap()).unwrap();
    assert_eq!(sidecar["user_edits"]["Jack White"]["AI Rating"], "8");
    assert!(sidecar["user_edits"]["Jack White"].get("Genre").is_none());
    assert!(sidecar["last_updated"].is_string());
}

#[tokio::test]
async fn test_sync_adds_artists_and_restores_user_values() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Jack White", &[(AI_SUMMARY, "Raw garage blues.")])]);
    let pipeline = pipeline(dir.path());
    pipeline.track().unwrap();
    // Cell lost by a hand edit of the CSV
    seed(dir.path(), vec![row("Jack White", &[])]);

    let source = MapSource::new(&[(LINEUP_URL, LINEUP_PAGE)]);
    let summary = pipeline.sync_lineup(&source, &mut engine()).await.unwrap();

    assert_eq!(summary.found, 2);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.restored, 1);

    let table = reload(dir.path());
    assert_eq!(table.len(), 2);
    assert_eq!(table.find("Jack White").unwrap().get(AI_SUMMARY), "Raw garage blues.");
    assert_eq!(table.find("Wet Leg").unwrap().get(FESTIVAL_URL), WET_LEG_URL);
}

#[tokio::test]
async fn test_sync_without_lineup_page_leaves_table_alone() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Jack White", &[])]);
    let before = std::fs::read_to_string(pipeline(dir.path()).paths().table.clone()).unwrap();

    let summary = pipeline(dir.path())
        .sync_lineup(&MapSource::default(), &mut engine())
        .await
        .unwrap();

    assert_eq!(summary.added, 0);
    let after = std::fs::read_to_string(pipeline(dir.path()).paths().table.clone()).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_scrape_fills_festival_columns_and_translates() {
    let dir = TempDir::new().unwrap();
    seed(
        dir.path(),
        vec![
            row("Wet Leg", &[(FESTIVAL_URL, WET_LEG_URL)]),
            row("Jack White", &[]),
        ],
    );
    let page = wet_leg_page();
    let source = MapSource::new(&[(WET_LEG_URL, page.as_str())]);
    let translator = MockProvider::always("\"Wet Leg is the indie rock duo of Rhian Teasdale and Hester Chambers.\"");

    let summary = pipeline(dir.path())
        .scrape(
            &source,
            &mut engine(),
            Some(&translator as &dyn EnrichmentProvider),
            &ScrapeOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unavailable, 1);
    assert!(source
        .requested()
        .contains(&"https://downtherabbithole.nl/programma/jack-white".to_string()));

    let table = reload(dir.path());
    let wet_leg = table.find("Wet Leg").unwrap();
    assert_eq!(wet_leg.get(FESTIVAL_BIO_NL), WET_LEG_BIO_NL);
    assert_eq!(
        wet_leg.get(FESTIVAL_BIO_EN),
        "Wet Leg is the indie rock duo of Rhian Teasdale and Hester Chambers."
    );
    assert_eq!(wet_leg.get(SPOTIFY_LINK), "https://open.spotify.com/artist/2TwOrUcYnAlIiKmVQkkoSZ");
    assert_eq!(wet_leg.social_links().get("Instagram").map(String::as_str), Some("https://www.instagram.com/wetlegband"));
    assert!(table.has_column(SOCIAL_LINKS));
}

#[tokio::test]
async fn test_scrape_without_translator_leaves_english_empty() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Wet Leg", &[(FESTIVAL_URL, WET_LEG_URL)])]);
    let page = wet_leg_page();
    let source = MapSource::new(&[(WET_LEG_URL, page.as_str())]);

    pipeline(dir.path())
        .scrape(&source, &mut engine(), None, &ScrapeOptions::default())
        .await
        .unwrap();

    let table = reload(dir.path());
    let wet_leg = table.find("Wet Leg").unwrap();
    assert_eq!(wet_leg.get(FESTIVAL_BIO_NL), WET_LEG_BIO_NL);
    assert!(wet_leg.is_empty(FESTIVAL_BIO_EN));
}

#[tokio::test]
async fn test_enrich_uses_festival_bio_and_keeps_user_rating() {
    let dir = TempDir::new().unwrap();
    seed(
        dir.path(),
        vec![row(
            "Wet Leg",
            &[(AI_RATING, "9"), (FESTIVAL_BIO_NL, WET_LEG_BIO_NL)],
        )],
    );
    let provider = std::sync::Arc::new(MockProvider::new(|prompt, _| {
        if prompt.temperature < 0.2 {
            Ok(r#"{"Genre": "Indie rock", "Number of People in Act": "duo"}"#.to_string())
        } else {
            Ok(r#"{"Genre": "", "Bio": "", "AI Summary": "Deadpan indie hooks.", "AI Rating": "5"}"#.to_string())
        }
    }));
    let options = BatchOptions {
        force: true,
        ..Default::default()
    };

    let summary = pipeline(dir.path())
        .enrich(provider.clone(), &options, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.enriched, 1);
    let table = reload(dir.path());
    let wet_leg = table.find("Wet Leg").unwrap();
    // Present before the pass, so user-owned even under force
    assert_eq!(wet_leg.get(AI_RATING), "9");
    assert_eq!(wet_leg.get(AI_SUMMARY), "Deadpan indie hooks.");
    assert_eq!(wet_leg.get(BIO), format!("{} {}", FESTIVAL_BIO_DISCLAIMER, WET_LEG_BIO_NL));
    assert_eq!(wet_leg.get(GENRE), "Indie rock");
}

#[tokio::test]
async fn test_enrich_without_changes_does_not_rewrite_table() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Wet Leg", &[])]);
    let pipeline = pipeline(dir.path());
    let modified = std::fs::metadata(&pipeline.paths().table).unwrap().modified().unwrap();
    let provider = std::sync::Arc::new(MockProvider::always("not json"));

    let summary = pipeline
        .enrich(provider, &BatchOptions::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(std::fs::metadata(&pipeline.paths().table).unwrap().modified().unwrap(), modified);
}

#[tokio::test]
async fn test_blank_artist_filter_is_rejected() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), vec![row("Wet Leg", &[])]);
    let provider = std::sync::Arc::new(MockProvider::always("{}"));
    let options = BatchOptions {
        artist_filter: Some("   ".into()),
        ..Default::default()
    };

    let result = pipeline(dir.path())
        .enrich(provider.clone(), &options, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(provider.calls(), 0);

    let scrape_options = ScrapeOptions {
        artist_filter: Some(String::new()),
        ..Default::default()
    };
    let result = pipeline(dir.path())
        .scrape(&MapSource::default(), &mut engine(), None, &scrape_options)
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_scrape_keeps_existing_english_bio_without_translating() {
    let dir = TempDir::new().unwrap();
    let english = "Wet Leg are an indie rock duo from the Isle of Wight.";
    seed(
        dir.path(),
        vec![row("Wet Leg", &[(FESTIVAL_URL, WET_LEG_URL), (FESTIVAL_BIO_EN, english)])],
    );
    let page = wet_leg_page();
    let source = MapSource::new(&[(WET_LEG_URL, page.as_str())]);
    let translator = MockProvider::always("\"Something else entirely.\"");

    pipeline(dir.path())
        .scrape(
            &source,
            &mut engine(),
            Some(&translator as &dyn EnrichmentProvider),
            &ScrapeOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(translator.calls(), 0);
    let table = reload(dir.path());
    let wet_leg = table.find("Wet Leg").unwrap();
    assert_eq!(wet_leg.get(FESTIVAL_BIO_NL), WET_LEG_BIO_NL);
    assert_eq!(wet_leg.get(FESTIVAL_BIO_EN), english);
}

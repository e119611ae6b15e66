//! Merge rule properties
//!
//! - Fill-empty-only without force
//! - User ownership survives force
//! - Rating boost: clamp(round(r + b), 1, 10)
//! - A second identical pass changes nothing

mod helpers;

use helpers::{row, table, tracker, LogCapture, MockProvider};
use lineup_enrich::merge::engine::merge_into_table;
use lineup_enrich::merge::{apply, enrich_table, ArtistProposal, BatchOptions, MergePolicy};
use lineup_enrich::provenance::{ProvenanceTracker, Source};
use lineup_enrich::records::columns::{AI_RATING, AI_SUMMARY, BIO, COUNTRY, GENRE};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn candidates(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ai_policy(force: bool, rating_boost: f64) -> MergePolicy {
    MergePolicy {
        force,
        rating_boost,
        source: Source::Ai,
    }
}

#[tokio::test]
async fn test_discovery_boost_rounds_rating_up() {
    let dir = TempDir::new().unwrap();
    let mut provenance = tracker(dir.path());
    let mut table = table(vec![row("X", &[(AI_RATING, ""), (AI_SUMMARY, "")])]);
    let provider = Arc::new(MockProvider::always(
        r#"{"AI Rating": "7", "AI Summary": "solid live act"}"#,
    ));
    let options = BatchOptions {
        rating_boost: 1.5,
        ..Default::default()
    };

    let (logs, _guard) = LogCapture::scoped();
    let summary = enrich_table(&mut table, &mut provenance, provider, &options, CancellationToken::new()).await;

    let x = table.find("X").unwrap();
    assert_eq!(x.get(AI_RATING), "9");
    assert_eq!(x.get(AI_SUMMARY), "solid live act");
    assert_eq!(summary.enriched, 1);
    assert_eq!(summary.fields_changed, 2);
    logs.assert_contains("Rating adjusted");
}

#[test]
fn test_rating_is_clamped_to_scale() {
    let dir = TempDir::new().unwrap();
    let mut provenance = tracker(dir.path());

    for (rating, boost, expected) in [("10", 1.5, "10"), ("2", -3.0, "1"), ("6.4", 0.0, "6"), ("4", 2.0, "6")] {
        let mut r = row("Rating", &[]);
        apply(&mut r, &candidates(&[(AI_RATING, rating)]), &mut provenance, &ai_policy(false, boost));
        assert_eq!(r.get(AI_RATING), expected, "rating {} boost {}", rating, boost);
    }
}

#[test]
fn test_force_overwrites_unprotected_bio_only() {
    let dir = TempDir::new().unwrap();
    let proposal = candidates(&[(BIO, "generic AI bio")]);

    // Default protected set: rating and summary only
    let mut provenance = tracker(dir.path());
    let mut y = row("Y", &[(BIO, "hand-written bio")]);
    provenance.track(std::slice::from_ref(&y));
    apply(&mut y, &proposal, &mut provenance, &ai_policy(true, 0.0));
    assert_eq!(y.get(BIO), "generic AI bio");

    // Bio added to the protected set
    let protected = vec![AI_RATING.to_string(), AI_SUMMARY.to_string(), BIO.to_string()];
    let mut provenance = ProvenanceTracker::new(dir.path().join("bio.json"), &protected);
    let mut y = row("Y", &[(BIO, "hand-written bio")]);
    provenance.track(std::slice::from_ref(&y));
    let changes = apply(&mut y, &proposal, &mut provenance, &ai_policy(true, 0.0));
    assert!(changes.is_empty());
    assert_eq!(y.get(BIO), "hand-written bio");
}

#[test]
fn test_tracked_values_survive_every_pass() {
    let dir = TempDir::new().unwrap();
    let mut provenance = tracker(dir.path());
    let mut table = table(vec![
        row("Amyl and the Sniffers", &[(AI_RATING, "8"), (AI_SUMMARY, "Feral pub punk.")]),
        row("Kneecap", &[(AI_RATING, "7")]),
    ]);
    provenance.track(&table.rows);

    for force in [false, true] {
        for artist in ["Amyl and the Sniffers", "Kneecap"] {
            let proposal = ArtistProposal {
                artist: artist.to_string(),
                values: candidates(&[(AI_RATING, "3"), (AI_SUMMARY, "Generic.")]),
                fallback: None,
            };
            merge_into_table(&mut table, &proposal, &mut provenance, &ai_policy(force, 2.0));
        }
    }

    let amyl = table.find("Amyl and the Sniffers").unwrap();
    assert_eq!(amyl.get(AI_RATING), "8");
    assert_eq!(amyl.get(AI_SUMMARY), "Feral pub punk.");
    let kneecap = table.find("Kneecap").unwrap();
    assert_eq!(kneecap.get(AI_RATING), "7");
    // Empty and never tracked, so still writable
    assert_eq!(kneecap.get(AI_SUMMARY), "Generic.");
}

#[test]
fn test_fill_empty_only_never_replaces_values() {
    let dir = TempDir::new().unwrap();
    let mut provenance = tracker(dir.path());
    let before = vec![
        row("Bombino", &[(GENRE, "Desert blues"), (COUNTRY, "")]),
        row("Nilüfer Yanya", &[(GENRE, ""), (COUNTRY, "UK"), (BIO, "Londoner.")]),
        row("Sampha", &[(GENRE, "R&B"), (COUNTRY, "UK"), (BIO, "")]),
    ];
    let mut after = before.clone();
    let proposal = candidates(&[(GENRE, "Rock"), (COUNTRY, "USA"), (BIO, "Some bio.")]);

    for r in after.iter_mut() {
        apply(r, &proposal, &mut provenance, &ai_policy(false, 0.0));
    }

    for (old, new) in before.iter().zip(&after) {
        for field in [GENRE, COUNTRY, BIO] {
            if !old.is_empty(field) {
                assert_eq!(old.get(field), new.get(field), "{} {}", old.artist_name(), field);
            } else {
                assert_eq!(new.get(field), proposal[field]);
            }
        }
    }
}

#[tokio::test]
async fn test_second_identical_pass_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut provenance = tracker(dir.path());
    let mut table = table(vec![row("Yard Act", &[]), row("Squid", &[])]);
    // Country never supplied, so both rows stay eligible for a second call
    let provider = Arc::new(MockProvider::always(
        r#"{"Genre": "Post-punk", "Bio": "Leeds band.", "AI Summary": "Wry.", "AI Rating": 7, "Country": ""}"#,
    ));
    let options = BatchOptions::default();

    let first = enrich_table(&mut table, &mut provenance, provider.clone(), &options, CancellationToken::new()).await;
    let snapshot = table.clone();
    let second = enrich_table(&mut table, &mut provenance, provider.clone(), &options, CancellationToken::new()).await;

    assert_eq!(first.enriched, 2);
    assert!(first.has_changes());
    assert_eq!(provider.calls(), 4);
    assert_eq!(second.enriched, 0);
    assert_eq!(second.unchanged, 2);
    assert!(!second.has_changes());
    assert_eq!(table, snapshot);
}

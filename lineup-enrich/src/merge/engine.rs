//! Per-row write rules

use super::rating::apply_boost;
use crate::provenance::{ProvenanceTracker, Source};
use crate::records::values::parse_rating;
use crate::records::{columns, ArtistRecord, Table};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Prefix marking a `Bio` copied from the festival page
pub const FESTIVAL_BIO_DISCLAIMER: &str =
    "[using festival bio due to a lack of publicly available data]";

/// How candidates are written
#[derive(Debug, Clone, PartialEq)]
pub struct MergePolicy {
    /// Overwrite non-empty cells (never user-owned ones)
    pub force: bool,
    /// Added to provider ratings before rounding and clamping
    pub rating_boost: f64,
    /// Recorded in the provenance sidecar for protected fields
    pub source: Source,
}

impl MergePolicy {
    pub fn fill_empty(source: Source) -> Self {
        Self {
            force: false,
            rating_boost: 0.0,
            source,
        }
    }
}

/// A written cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

/// Festival bio substituted for a `Bio` the provider could not supply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioFallback {
    /// Disclaimer-prefixed bio
    pub bio: String,
    /// Structured fields extracted from the festival bio
    pub extracted: BTreeMap<String, String>,
}

impl BioFallback {
    pub fn new(festival_bio: &str, extracted: BTreeMap<String, String>) -> Self {
        Self {
            bio: format!("{} {}", FESTIVAL_BIO_DISCLAIMER, festival_bio.trim()),
            extracted,
        }
    }
}

/// Everything one source proposes for one artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistProposal {
    pub artist: String,
    pub values: BTreeMap<String, String>,
    pub fallback: Option<BioFallback>,
}

/// Write permitted candidates into `row`
///
/// A candidate is written only if it is non-empty, the field is not
/// user-owned, and the cell is empty (or `force` is set). Ratings go
/// through [`apply_boost`]; non-numeric ratings are dropped. Returns the
/// cells that actually changed.
pub fn apply(
    row: &mut ArtistRecord,
    candidates: &BTreeMap<String, String>,
    provenance: &mut ProvenanceTracker,
    policy: &MergePolicy,
) -> Vec<FieldChange> {
    let artist = row.artist_name().to_string();
    let mut changes = Vec::new();

    for (field, candidate) in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() || field == columns::ARTIST {
            continue;
        }
        if provenance.is_user_owned(&artist, field) {
            debug!(artist = %artist, field = %field, "User-owned, not writing");
            continue;
        }
        if !row.is_empty(field) && !policy.force {
            continue;
        }

        let new_value = if field == columns::AI_RATING {
            let Some(rating) = parse_rating(candidate) else {
                debug!(artist = %artist, value = %candidate, "Dropping non-numeric rating");
                continue;
            };
            let boosted = apply_boost(rating, policy.rating_boost);
            if f64::from(boosted) != rating {
                info!(
                    artist = %artist,
                    original = rating,
                    adjusted = boosted,
                    boost = policy.rating_boost,
                    "Rating adjusted"
                );
            }
            boosted.to_string()
        } else {
            candidate.to_string()
        };

        let old = row.get(field).to_string();
        if old == new_value {
            continue;
        }
        row.set(field, new_value.clone());
        if provenance.is_protected(field) {
            provenance.record_automated(&artist, field, &new_value, policy.source);
        }
        debug!(artist = %artist, field = %field, "Field written");
        changes.push(FieldChange {
            field: field.clone(),
            old,
            new: new_value,
        });
    }
    changes
}

/// Apply a full proposal: primary values, then the fallback bio, then the
/// extracted fields (fill-empty only, regardless of `force`)
pub fn merge_proposal(
    row: &mut ArtistRecord,
    proposal: &ArtistProposal,
    provenance: &mut ProvenanceTracker,
    policy: &MergePolicy,
) -> Vec<FieldChange> {
    let mut changes = apply(row, &proposal.values, provenance, policy);

    if let Some(fallback) = &proposal.fallback {
        let bio = BTreeMap::from([(columns::BIO.to_string(), fallback.bio.clone())]);
        let bio_changes = apply(row, &bio, provenance, policy);
        if !bio_changes.is_empty() {
            info!(artist = %proposal.artist, "Using festival bio as fallback");
        }
        changes.extend(bio_changes);

        let backfill = MergePolicy {
            force: false,
            ..policy.clone()
        };
        for change in apply(row, &fallback.extracted, provenance, &backfill) {
            info!(
                artist = %proposal.artist,
                field = %change.field,
                value = %change.new,
                "Extracted from festival bio"
            );
            changes.push(change);
        }
    }
    changes
}

/// Merge `proposal` into the matching row of `table`
///
/// Appends any written column missing from the header. `None` if the
/// artist is not in the table.
pub fn merge_into_table(
    table: &mut Table,
    proposal: &ArtistProposal,
    provenance: &mut ProvenanceTracker,
    policy: &MergePolicy,
) -> Option<Vec<FieldChange>> {
    let row = table.find_mut(&proposal.artist)?;
    let changes = merge_proposal(row, proposal, provenance, policy);
    for change in &changes {
        table.ensure_column(&change.field);
    }
    Some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tracker(dir: &TempDir) -> ProvenanceTracker {
        ProvenanceTracker::new(
            dir.path().join("prov.json"),
            &[columns::AI_RATING.to_string(), columns::AI_SUMMARY.to_string()],
        )
    }

    fn candidates(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fill_empty_only_without_force() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let mut row = ArtistRecord::new("Black Country, New Road");
        row.set(columns::GENRE, "Art rock");

        let changes = apply(
            &mut row,
            &candidates(&[(columns::GENRE, "Post-rock"), (columns::COUNTRY, "UK")]),
            &mut provenance,
            &MergePolicy::fill_empty(Source::Ai),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(row.get(columns::GENRE), "Art rock");
        assert_eq!(row.get(columns::COUNTRY), "UK");
    }

    #[test]
    fn test_force_overwrites_but_not_user_owned() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let mut row = ArtistRecord::new("Self Esteem");
        row.set(columns::GENRE, "Pop");
        row.set(columns::AI_SUMMARY, "My own take");
        provenance.track(std::slice::from_ref(&row));

        let policy = MergePolicy {
            force: true,
            ..MergePolicy::fill_empty(Source::Ai)
        };
        apply(
            &mut row,
            &candidates(&[(columns::GENRE, "Art pop"), (columns::AI_SUMMARY, "Generic")]),
            &mut provenance,
            &policy,
        );

        assert_eq!(row.get(columns::GENRE), "Art pop");
        assert_eq!(row.get(columns::AI_SUMMARY), "My own take");
    }

    #[test]
    fn test_rating_boost_and_non_numeric_rating() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let policy = MergePolicy {
            rating_boost: 1.5,
            ..MergePolicy::fill_empty(Source::Ai)
        };

        let mut row = ArtistRecord::new("X");
        apply(&mut row, &candidates(&[(columns::AI_RATING, "7")]), &mut provenance, &policy);
        assert_eq!(row.get(columns::AI_RATING), "9");

        let mut row = ArtistRecord::new("W");
        let changes = apply(&mut row, &candidates(&[(columns::AI_RATING, "great")]), &mut provenance, &policy);
        assert!(changes.is_empty());
        assert!(row.is_empty(columns::AI_RATING));
    }

    #[test]
    fn test_automated_protected_write_recorded_as_ai() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let mut row = ArtistRecord::new("Nilüfer Yanya");

        apply(
            &mut row,
            &candidates(&[(columns::AI_SUMMARY, "Smoky guitar pop")]),
            &mut provenance,
            &MergePolicy::fill_empty(Source::Ai),
        );

        let entry = provenance.entry("Nilüfer Yanya", columns::AI_SUMMARY).unwrap();
        assert_eq!(entry.source, Source::Ai);
        assert!(!provenance.is_user_owned("Nilüfer Yanya", columns::AI_SUMMARY));
    }

    #[test]
    fn test_fallback_backfills_only_empty_fields_even_with_force() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let mut row = ArtistRecord::new("Altın Gün");
        row.set(columns::COUNTRY, "Netherlands");

        let proposal = ArtistProposal {
            artist: "Altın Gün".into(),
            values: BTreeMap::new(),
            fallback: Some(BioFallback::new(
                "Amsterdamse band die Turkse psychedelica speelt.",
                candidates(&[(columns::COUNTRY, "Turkey"), (columns::GENRE, "Psychedelia")]),
            )),
        };
        let policy = MergePolicy {
            force: true,
            ..MergePolicy::fill_empty(Source::Ai)
        };

        let changes = merge_proposal(&mut row, &proposal, &mut provenance, &policy);

        assert_eq!(changes.len(), 2);
        assert!(row.get(columns::BIO).starts_with(FESTIVAL_BIO_DISCLAIMER));
        assert_eq!(row.get(columns::COUNTRY), "Netherlands");
        assert_eq!(row.get(columns::GENRE), "Psychedelia");
    }

    #[test]
    fn test_merge_into_table_appends_missing_column() {
        let dir = TempDir::new().unwrap();
        let mut provenance = tracker(&dir);
        let mut table = Table {
            fieldnames: vec![columns::ARTIST.to_string()],
            rows: vec![ArtistRecord::new("Amyl and the Sniffers")],
        };
        let proposal = ArtistProposal {
            artist: "amyl and the sniffers".into(),
            values: candidates(&[(columns::COUNTRY, "Australia")]),
            fallback: None,
        };

        let changes = merge_into_table(&mut table, &proposal, &mut provenance, &MergePolicy::fill_empty(Source::Ai));

        assert_eq!(changes.map(|c| c.len()), Some(1));
        assert_eq!(table.fieldnames, vec![columns::ARTIST, columns::COUNTRY]);

        let missing = ArtistProposal {
            artist: "Nobody".into(),
            ..proposal
        };
        assert!(merge_into_table(&mut table, &missing, &mut provenance, &MergePolicy::fill_empty(Source::Ai)).is_none());
    }
}

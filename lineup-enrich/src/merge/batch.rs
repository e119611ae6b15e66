//! Enrichment pass over a whole table
//!
//! Rows are snapshotted into jobs, each job asks the provider for one
//! artist on a bounded worker pool (`buffer_unordered`), and proposals are
//! merged into the table on the calling task as they complete. Workers
//! never touch the table or the provenance tracker.

use super::engine::{merge_into_table, ArtistProposal, BioFallback, MergePolicy};
use crate::ai::prompt::{bio_extraction_prompt, enrichment_prompt};
use crate::ai::{parse_proposal, EnrichmentProvider, Prompt};
use crate::error::ProviderError;
use crate::provenance::{ProvenanceTracker, Source};
use crate::records::columns::{self, AI_FIELDS, BIO_EXTRACTION_FIELDS, ENRICHMENT_TRIGGER_FIELDS};
use crate::records::{ArtistRecord, Table};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What to do when the provider answers 429
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Longer Retry-After values skip the artist instead of waiting
    pub max_wait: Duration,
    /// Cancel the rest of the batch when a wait exceeds `max_wait`
    pub abandon_batch: bool,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            abandon_batch: false,
        }
    }
}

/// Options for one enrichment pass
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub force: bool,
    /// Only this artist (case-insensitive)
    pub artist_filter: Option<String>,
    /// Concurrent provider calls
    pub workers: usize,
    pub rating_boost: f64,
    pub rate_limit: RateLimitPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            force: false,
            artist_filter: None,
            workers: 2,
            rating_boost: 0.0,
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

/// Pass totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// At least one field written
    pub enriched: usize,
    /// Provider answered but nothing was writable
    pub unchanged: usize,
    /// Not sent (complete rows) or given up on (rate limit, cancellation)
    pub skipped: usize,
    /// Provider error or unusable response
    pub failed: usize,
    /// Cells written across all artists
    pub fields_changed: usize,
}

impl BatchSummary {
    /// True if the table must be saved
    pub fn has_changes(&self) -> bool {
        self.fields_changed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} enriched, {} unchanged, {} skipped, {} failed ({} fields written)",
            self.enriched, self.unchanged, self.skipped, self.failed, self.fields_changed
        )
    }
}

/// Row needs the provider: always with `force`, otherwise if any trigger
/// field is empty
pub fn needs_enrichment(row: &ArtistRecord, force: bool) -> bool {
    force || ENRICHMENT_TRIGGER_FIELDS.iter().any(|f| row.is_empty(f))
}

/// Row snapshot handed to a worker
#[derive(Debug, Clone)]
struct Job {
    artist: String,
    /// Passed to the prompt unless `force`
    existing_bio: Option<String>,
    festival_bio: Option<String>,
    /// A fallback bio could be written
    bio_writable: bool,
    /// Extraction targets still empty in the snapshot
    empty_extraction_fields: BTreeSet<String>,
}

#[derive(Debug)]
enum JobOutcome {
    Proposal(ArtistProposal),
    Skipped,
    Failed(ProviderError),
}

/// Run one enrichment pass over `table`
///
/// Never fails as a whole: per-artist errors are logged and counted. Only
/// cells that change are written; the caller saves the table if
/// [`BatchSummary::has_changes`].
pub async fn enrich_table(
    table: &mut Table,
    provenance: &mut ProvenanceTracker,
    provider: Arc<dyn EnrichmentProvider>,
    options: &BatchOptions,
    cancel: CancellationToken,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let filter = options
        .artist_filter
        .as_deref()
        .map(|a| a.trim().to_lowercase());

    let mut jobs = Vec::new();
    for row in &table.rows {
        let artist = row.artist_name();
        if artist.is_empty() {
            continue;
        }
        if filter.as_deref().is_some_and(|f| artist.to_lowercase() != f) {
            continue;
        }
        if !needs_enrichment(row, options.force) {
            summary.skipped += 1;
            continue;
        }
        jobs.push(snapshot(row, provenance, options.force));
    }

    if let Some(f) = &filter {
        if jobs.is_empty() && summary.skipped == 0 {
            warn!(artist = %f, "Artist not found in table");
        }
    }
    if jobs.is_empty() {
        info!("No artists need enrichment");
        return summary;
    }

    let workers = options.workers.max(1);
    info!(
        artists = jobs.len(),
        workers,
        provider = provider.name(),
        force = options.force,
        "Enriching artists"
    );

    let retry_available = Arc::new(AtomicBool::new(true));
    let mut results = stream::iter(jobs)
        .map(|job| {
            let provider = provider.clone();
            let retry_available = retry_available.clone();
            let cancel = cancel.clone();
            let force = options.force;
            let rate_limit = options.rate_limit.clone();

            async move {
                let artist = job.artist.clone();
                let outcome =
                    run_job(job, provider.as_ref(), force, &rate_limit, &retry_available, &cancel).await;
                (artist, outcome)
            }
        })
        .buffer_unordered(workers);

    let policy = MergePolicy {
        force: options.force,
        rating_boost: options.rating_boost,
        source: Source::Ai,
    };

    while let Some((artist, outcome)) = results.next().await {
        match outcome {
            JobOutcome::Proposal(proposal) => {
                match merge_into_table(table, &proposal, provenance, &policy) {
                    Some(changes) if !changes.is_empty() => {
                        info!(artist = %artist, fields = changes.len(), "Enriched");
                        summary.enriched += 1;
                        summary.fields_changed += changes.len();
                    }
                    Some(_) => {
                        debug!(artist = %artist, "Nothing writable in response");
                        summary.unchanged += 1;
                    }
                    None => {
                        warn!(artist = %artist, "Row disappeared during pass");
                        summary.failed += 1;
                    }
                }
            }
            JobOutcome::Skipped => summary.skipped += 1,
            JobOutcome::Failed(e) => {
                warn!(artist = %artist, error = %e, "Enrichment failed, keeping existing values");
                summary.failed += 1;
            }
        }
    }

    info!(%summary, "Enrichment pass complete");
    summary
}

fn snapshot(row: &ArtistRecord, provenance: &ProvenanceTracker, force: bool) -> Job {
    let artist = row.artist_name().to_string();
    let bio = row.get(columns::BIO).trim();
    let bio_writable =
        (bio.is_empty() || force) && !provenance.is_user_owned(&artist, columns::BIO);

    Job {
        existing_bio: (!force && !bio.is_empty()).then(|| bio.to_string()),
        festival_bio: row.festival_bio().map(str::to_string),
        bio_writable,
        empty_extraction_fields: BIO_EXTRACTION_FIELDS
            .iter()
            .filter(|f| row.is_empty(f))
            .map(|f| f.to_string())
            .collect(),
        artist,
    }
}

async fn run_job(
    job: Job,
    provider: &dyn EnrichmentProvider,
    force: bool,
    rate_limit: &RateLimitPolicy,
    retry_available: &AtomicBool,
    cancel: &CancellationToken,
) -> JobOutcome {
    if cancel.is_cancelled() {
        return JobOutcome::Skipped;
    }
    debug!(artist = %job.artist, "Worker starting artist");

    let existing_bio = if force { None } else { job.existing_bio.as_deref() };
    let prompt = enrichment_prompt(&job.artist, existing_bio);

    let raw = match call_with_rate_limit(provider, &prompt, &job.artist, rate_limit, retry_available, cancel).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return JobOutcome::Skipped,
        Err(e) => return JobOutcome::Failed(e),
    };

    let parsed = match parse_proposal(&raw, &AI_FIELDS) {
        Ok(parsed) => parsed,
        Err(e) => return JobOutcome::Failed(e),
    };
    for field in [columns::AI_RATING, columns::AI_SUMMARY] {
        if parsed.blank.contains(field) {
            info!(artist = %job.artist, field, "Provider had insufficient data");
        }
    }

    let mut fallback = None;
    let bio_missing = parsed.blank.contains(columns::BIO) && !parsed.values.contains_key(columns::BIO);
    if bio_missing && job.bio_writable {
        match job.festival_bio.as_deref() {
            Some(festival_bio) => {
                let extracted = extract_from_bio(provider, &job, festival_bio, &parsed.values).await;
                fallback = Some(BioFallback::new(festival_bio, extracted));
            }
            None => {
                info!(artist = %job.artist, "Bio left empty (insufficient data, no festival bio)");
            }
        }
    }

    JobOutcome::Proposal(ArtistProposal {
        artist: job.artist,
        values: parsed.values,
        fallback,
    })
}

/// Secondary low-temperature pass over the festival bio
///
/// Only fields empty in the snapshot and not supplied by the primary
/// response are kept. Failures yield nothing.
async fn extract_from_bio(
    provider: &dyn EnrichmentProvider,
    job: &Job,
    festival_bio: &str,
    primary: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let targets: Vec<&str> = BIO_EXTRACTION_FIELDS
        .iter()
        .copied()
        .filter(|f| job.empty_extraction_fields.contains(*f) && !primary.contains_key(*f))
        .collect();
    if targets.is_empty() {
        return BTreeMap::new();
    }

    debug!(artist = %job.artist, "Extracting metadata from festival bio");
    let prompt = bio_extraction_prompt(&job.artist, festival_bio);
    let result = provider
        .enrich(&prompt)
        .await
        .and_then(|raw| parse_proposal(&raw, &targets));
    match result {
        Ok(parsed) => parsed.values,
        Err(e) => {
            warn!(artist = %job.artist, error = %e, "Bio extraction failed");
            BTreeMap::new()
        }
    }
}

/// Call the provider, waiting out at most one rate limit per batch
///
/// `Ok(None)` means the artist was given up on: the wait was too long, the
/// retry budget was already spent, or the batch was cancelled.
async fn call_with_rate_limit(
    provider: &dyn EnrichmentProvider,
    prompt: &Prompt,
    artist: &str,
    policy: &RateLimitPolicy,
    retry_available: &AtomicBool,
    cancel: &CancellationToken,
) -> Result<Option<String>, ProviderError> {
    let retry_after = match provider.enrich(prompt).await {
        Ok(raw) => return Ok(Some(raw)),
        Err(ProviderError::RateLimited { retry_after }) => retry_after,
        Err(e) => return Err(e),
    };

    if retry_after > policy.max_wait {
        warn!(
            artist = %artist,
            wait_minutes = retry_after.as_secs_f64() / 60.0,
            "Rate limited, skipping for now; run again later to continue"
        );
        if policy.abandon_batch {
            warn!("Abandoning remaining batch after long rate-limit wait");
            cancel.cancel();
        }
        return Ok(None);
    }

    if !retry_available.swap(false, Ordering::SeqCst) {
        warn!(artist = %artist, "Rate limited and retry budget spent, skipping");
        return Ok(None);
    }

    info!(artist = %artist, wait_secs = retry_after.as_secs(), "Rate limited, waiting before single retry");
    tokio::select! {
        _ = cancel.cancelled() => return Ok(None),
        _ = tokio::time::sleep(retry_after) => {}
    }

    match provider.enrich(prompt).await {
        Ok(raw) => Ok(Some(raw)),
        Err(ProviderError::RateLimited { .. }) => {
            warn!(artist = %artist, "Still rate limited after retry, skipping");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

//! Pass orchestration
//!
//! Every pass follows the same lifecycle: load the table and the stores it
//! needs, run, save whatever changed, once. Nothing is held between passes.

use crate::ai::EnrichmentProvider;
use crate::extraction::ExtractionEngine;
use crate::fetch::PageSource;
use crate::festival_data::{scrape_festival_data, ScrapeOptions, ScrapeSummary};
use crate::lineup::{sync_lineup, SyncSummary};
use crate::merge::{enrich_table, BatchOptions, BatchSummary};
use crate::provenance::ProvenanceTracker;
use crate::records::{RecordStore, Table, TableId};
use crate::selectors::SelectorStore;
use lineup_common::config::TablePaths;
use lineup_common::{Error, FestivalConfig, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

/// One festival-year and its stores
pub struct Pipeline {
    festival: FestivalConfig,
    table_id: TableId,
    store: RecordStore,
    paths: TablePaths,
    protected_fields: Vec<String>,
}

impl Pipeline {
    pub fn new(data_root: &Path, festival: FestivalConfig, year: u16, protected_fields: Vec<String>) -> Self {
        Self {
            table_id: TableId::new(&festival.slug, year),
            store: RecordStore::new(data_root),
            paths: TablePaths::new(data_root, &festival.slug, year),
            festival,
            protected_fields,
        }
    }

    pub fn festival(&self) -> &FestivalConfig {
        &self.festival
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }

    fn span(&self, pass: &'static str) -> Span {
        info_span!(
            "pass",
            pass_id = %Uuid::new_v4(),
            pass,
            festival = %self.festival.slug,
            year = self.table_id.year
        )
    }

    /// Load the table; missing CSV is an error
    pub fn load_table(&self) -> Result<Table> {
        self.store.load(&self.table_id)
    }

    fn load_provenance(&self) -> Result<ProvenanceTracker> {
        ProvenanceTracker::load(&self.paths.provenance, &self.protected_fields)
    }

    fn load_selectors(&self) -> Result<SelectorStore> {
        SelectorStore::load(&self.paths.selectors)
    }

    /// Record every non-empty protected value as user-owned
    ///
    /// Returns the number of entries created or changed.
    pub fn track(&self) -> Result<usize> {
        let _guard = self.span("track").entered();
        let table = self.load_table()?;
        let mut provenance = self.load_provenance()?;
        let tracked = provenance.track(&table.rows);
        provenance.save()?;
        info!(tracked, "Tracking complete");
        Ok(tracked)
    }

    /// Add newly announced artists from the lineup page
    pub async fn sync_lineup(
        &self,
        source: &dyn PageSource,
        engine: &mut ExtractionEngine,
    ) -> Result<SyncSummary> {
        let span = self.span("sync-lineup");
        async move {
            let mut table = self.load_table()?;
            let mut provenance = self.load_provenance()?;
            let mut selectors = self.load_selectors()?;

            let summary = sync_lineup(
                &mut table,
                &mut provenance,
                &mut selectors,
                engine,
                source,
                &self.festival,
            )
            .await;

            if summary.table_changed() {
                self.store.save(&self.table_id, &table)?;
            }
            provenance.save()?;
            selectors.save_if_learned()?;
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Scrape festival pages for bios, social links and Spotify links
    pub async fn scrape(
        &self,
        source: &dyn PageSource,
        engine: &mut ExtractionEngine,
        translator: Option<&dyn EnrichmentProvider>,
        options: &ScrapeOptions,
    ) -> Result<ScrapeSummary> {
        check_artist_filter(options.artist_filter.as_deref())?;
        let span = self.span("scrape");
        async move {
            let mut table = self.load_table()?;
            let mut provenance = self.load_provenance()?;
            let mut selectors = self.load_selectors()?;
            provenance.track(&table.rows);

            let summary = scrape_festival_data(
                &mut table,
                &mut provenance,
                &mut selectors,
                engine,
                source,
                translator,
                &self.festival,
                options,
            )
            .await;

            if summary.has_changes() {
                self.store.save(&self.table_id, &table)?;
            }
            provenance.save()?;
            selectors.save_if_learned()?;
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// AI enrichment pass
    ///
    /// Protected values are tracked first, so anything present before the
    /// pass stays as it is even with `force`.
    pub async fn enrich(
        &self,
        provider: Arc<dyn EnrichmentProvider>,
        options: &BatchOptions,
        cancel: CancellationToken,
    ) -> Result<BatchSummary> {
        check_artist_filter(options.artist_filter.as_deref())?;
        let span = self.span("enrich");
        async move {
            let mut table = self.load_table()?;
            let mut provenance = self.load_provenance()?;
            provenance.track(&table.rows);

            let options = BatchOptions {
                rating_boost: self.festival.rating_boost,
                ..options.clone()
            };
            let summary = enrich_table(&mut table, &mut provenance, provider, &options, cancel).await;

            if summary.has_changes() {
                self.store.save(&self.table_id, &table)?;
            }
            provenance.save()?;
            Ok(summary)
        }
        .instrument(span)
        .await
    }
}

/// A blank `--artist` would match nothing and silently do no work
fn check_artist_filter(filter: Option<&str>) -> Result<()> {
    match filter {
        Some(name) if name.trim().is_empty() => {
            Err(Error::InvalidInput("artist filter is empty".to_string()))
        }
        _ => Ok(()),
    }
}

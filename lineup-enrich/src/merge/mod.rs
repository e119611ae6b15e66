//! MergeEngine: which candidate values reach the table
//!
//! [`engine`] holds the per-row write rules (fill empty only, `force`,
//! user ownership, rating boost, festival-bio fallback). [`batch`] drives a
//! whole enrichment pass through a bounded worker pool and applies each
//! proposal on the calling task as it arrives.

pub mod batch;
pub mod engine;
pub mod rating;

pub use batch::{enrich_table, needs_enrichment, BatchOptions, BatchSummary, RateLimitPolicy};
pub use engine::{apply, merge_proposal, ArtistProposal, BioFallback, FieldChange, MergePolicy};
pub use rating::apply_boost;

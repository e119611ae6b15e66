//! # lineup-enrich
//!
//! Festival artist table enrichment:
//! - [`records`]: CSV-backed artist table (RecordStore)
//! - [`provenance`]: user ownership of protected fields
//! - [`selectors`] and [`extraction`]: self-learning page extraction
//! - [`merge`]: write rules and the concurrent enrichment pass
//! - [`lineup`] and [`festival_data`]: scraping passes
//! - [`pipeline`]: load → run → save lifecycle per pass

pub mod ai;
pub mod config;
pub mod error;
pub mod extraction;
pub mod festival_data;
pub mod fetch;
pub mod lineup;
pub mod merge;
pub mod pipeline;
pub mod provenance;
pub mod records;
pub mod selectors;

pub use error::{FetchError, ProviderError};
pub use pipeline::Pipeline;

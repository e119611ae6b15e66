//! # Lineup Common Library
//!
//! Shared code for the lineup tools including:
//! - Error types
//! - Configuration loading (TOML bootstrap, festival registry, data paths)
//! - Atomic JSON sidecar writes
//! - Artist slug generation
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod files;
pub mod slug;
pub mod time;

pub use config::{BioLanguage, FestivalConfig, TomlConfig};
pub use error::{Error, Result};
pub use slug::artist_slug;

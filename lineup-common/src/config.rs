//! Configuration loading, festival registry and data path resolution
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--config, --data-root)
//! 2. Environment variables (LINEUP_CONFIG, LINEUP_DATA_ROOT)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is never fatal: a warning is logged and compiled
//! defaults are used. An unknown festival is fatal.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "LINEUP_CONFIG";

/// Environment variable naming the data root folder
pub const DATA_ROOT_ENV_VAR: &str = "LINEUP_DATA_ROOT";

/// Festival used when none is given on the command line
pub const DEFAULT_FESTIVAL: &str = "down-the-rabbit-hole";

/// Fields treated as user-owned once a value has been observed
pub const DEFAULT_PROTECTED_FIELDS: [&str; 2] = ["AI Rating", "AI Summary"];

// ============================================================================
// TOML bootstrap
// ============================================================================

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding `<festival>/<year>/<year>.csv` tables and the selector store
    #[serde(default)]
    pub data_root: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Page fetching and selector learning
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// AI provider settings (credentials may come from the environment instead)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Fields protected by provenance tracking
    #[serde(default)]
    pub protection: ProtectionConfig,

    /// Festival definitions, keyed by festival slug
    ///
    /// Entries extend or override the built-in registry.
    #[serde(default)]
    pub festivals: BTreeMap<String, FestivalConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Ask an operator for a selector when learned and heuristic tiers fail
    #[serde(default)]
    pub interactive: bool,

    /// Politeness delay between page fetches
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Page fetch timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with page fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// AI provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// `azure`, `github` or `openai`
    #[serde(default)]
    pub kind: Option<String>,

    /// Endpoint (Azure resource URL, or a full chat-completions URL for others)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name, or deployment name for Azure
    #[serde(default)]
    pub model: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side pacing; unset means no pacing
    #[serde(default)]
    pub requests_per_minute: Option<u32>,

    /// Worker pool size; unset picks a provider-specific default
    #[serde(default)]
    pub workers: Option<usize>,

    /// Longest Retry-After the batch will wait out
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_rate_limit_wait_secs: u64,

    /// Cancel the remaining batch when a Retry-After exceeds the maximum wait
    #[serde(default)]
    pub abandon_batch_on_long_wait: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: None,
            endpoint: None,
            api_key: None,
            model: None,
            timeout_secs: default_timeout_secs(),
            requests_per_minute: None,
            workers: None,
            max_rate_limit_wait_secs: default_max_rate_limit_wait_secs(),
            abandon_batch_on_long_wait: false,
        }
    }
}

/// Protected field set
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtectionConfig {
    #[serde(default = "default_protected_fields")]
    pub fields: Vec<String>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            fields: default_protected_fields(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_rate_limit_wait_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; lineup-enrich/{})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_protected_fields() -> Vec<String> {
    DEFAULT_PROTECTED_FIELDS.iter().map(|f| f.to_string()).collect()
}

// ============================================================================
// Festival registry
// ============================================================================

/// Language of the bio published on a festival's artist pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum BioLanguage {
    #[default]
    Dutch,
    English,
}

/// Festival definition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FestivalConfig {
    /// Registry key; filled in by [`TomlConfig::festival`]
    #[serde(skip)]
    pub slug: String,

    pub name: String,
    pub base_url: String,
    pub lineup_url: String,

    /// Path segment for artist pages (e.g. `/programma/`)
    pub artist_path: String,

    /// Additive adjustment applied to AI ratings ("discovery" festivals)
    #[serde(default)]
    pub rating_boost: f64,

    #[serde(default)]
    pub bio_language: BioLanguage,

    /// Selector store key; defaults to the festival slug
    #[serde(default)]
    pub site_id: Option<String>,
}

impl FestivalConfig {
    /// Full URL for an artist page
    pub fn artist_url(&self, artist_slug: &str) -> String {
        format!("{}{}{}", self.base_url, self.artist_path, artist_slug)
    }

    /// Key under which learned selectors for this festival's site are stored
    pub fn site_id(&self) -> &str {
        self.site_id.as_deref().unwrap_or(&self.slug)
    }
}

/// Festivals known without any TOML configuration
pub fn builtin_festivals() -> BTreeMap<String, FestivalConfig> {
    let mut festivals = BTreeMap::new();
    festivals.insert(
        DEFAULT_FESTIVAL.to_string(),
        FestivalConfig {
            slug: DEFAULT_FESTIVAL.to_string(),
            name: "Down The Rabbit Hole".to_string(),
            base_url: "https://downtherabbithole.nl".to_string(),
            lineup_url: "https://downtherabbithole.nl/programma".to_string(),
            artist_path: "/programma/".to_string(),
            rating_boost: 0.0,
            bio_language: BioLanguage::Dutch,
            site_id: None,
        },
    );
    festivals
}

impl TomlConfig {
    /// Look up a festival by slug (TOML entries take precedence over built-ins)
    ///
    /// # Errors
    /// Returns `Error::NotFound` listing the available festivals if the slug is unknown.
    pub fn festival(&self, slug: &str) -> Result<FestivalConfig> {
        let mut registry = builtin_festivals();
        for (key, festival) in &self.festivals {
            registry.insert(key.clone(), festival.clone());
        }

        let available = registry.keys().cloned().collect::<Vec<_>>().join(", ");
        let mut festival = registry.remove(slug).ok_or_else(|| {
            Error::NotFound(format!("Unknown festival '{}'. Available: {}", slug, available))
        })?;
        festival.slug = slug.to_string();
        Ok(festival)
    }
}

// ============================================================================
// File resolution
// ============================================================================

/// Resolve the TOML config path
///
/// **Priority:** CLI → ENV → `<config_dir>/lineup/config.toml` (only if it exists)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("lineup").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the TOML bootstrap config
///
/// Missing file → warning + defaults. Unparseable file → `Error::Config`.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        debug!("No config file configured, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using built-in defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Resolve the data root folder
///
/// **Priority:** CLI → ENV → TOML → `./docs`
pub fn resolve_data_root(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_root {
        return path.clone();
    }

    PathBuf::from("docs")
}

/// File locations for one festival-year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    /// `<root>/<festival>/<year>/<year>.csv`
    pub table: PathBuf,
    /// `<root>/<festival>/<year>/.metadata/<year>_provenance.json`
    pub provenance: PathBuf,
    /// `<root>/learned_selectors.json`
    pub selectors: PathBuf,
}

impl TablePaths {
    pub fn new(data_root: &Path, festival_slug: &str, year: u16) -> Self {
        let dir = data_root.join(festival_slug).join(year.to_string());
        Self {
            table: dir.join(format!("{}.csv", year)),
            provenance: dir
                .join(".metadata")
                .join(format!("{}_provenance.json", year)),
            selectors: data_root.join("learned_selectors.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_festival_registry() {
        let config = TomlConfig::default();
        let festival = config.festival(DEFAULT_FESTIVAL).unwrap();

        assert_eq!(festival.slug, "down-the-rabbit-hole");
        assert_eq!(festival.bio_language, BioLanguage::Dutch);
        assert_eq!(
            festival.artist_url("radiohead"),
            "https://downtherabbithole.nl/programma/radiohead"
        );
        assert_eq!(festival.site_id(), "down-the-rabbit-hole");
    }

    #[test]
    fn test_unknown_festival_is_not_found() {
        let err = TomlConfig::default().festival("glastonbury").unwrap_err();
        assert!(matches!(err, Error::NotFound(msg) if msg.contains("glastonbury")));
    }

    #[test]
    fn test_toml_festival_overrides_builtin() {
        let config: TomlConfig = toml::from_str(
            r#"
            [festivals.down-the-rabbit-hole]
            name = "DTRH"
            base_url = "https://example.test"
            lineup_url = "https://example.test/lineup"
            artist_path = "/artists/"
            rating_boost = 1.5
            bio_language = "English"
            "#,
        )
        .unwrap();

        let festival = config.festival("down-the-rabbit-hole").unwrap();
        assert_eq!(festival.name, "DTRH");
        assert_eq!(festival.rating_boost, 1.5);
        assert_eq!(festival.bio_language, BioLanguage::English);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.scraper.request_delay_ms, 500);
        assert_eq!(config.provider.max_rate_limit_wait_secs, 300);
        assert_eq!(config.protection.fields, vec!["AI Rating", "AI Summary"]);
        assert!(!config.scraper.interactive);
    }

    #[test]
    fn test_table_paths_layout() {
        let paths = TablePaths::new(Path::new("/data"), "pinkpop", 2026);
        assert_eq!(paths.table, PathBuf::from("/data/pinkpop/2026/2026.csv"));
        assert_eq!(
            paths.provenance,
            PathBuf::from("/data/pinkpop/2026/.metadata/2026_provenance.json")
        );
        assert_eq!(paths.selectors, PathBuf::from("/data/learned_selectors.json"));
    }
}

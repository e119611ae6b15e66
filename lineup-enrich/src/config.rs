//! AI provider settings resolution
//!
//! Credentials resolve ENV → TOML:
//! 1. `AZURE_OPENAI_KEY` + `AZURE_OPENAI_ENDPOINT` (+ `AZURE_OPENAI_DEPLOYMENT`)
//! 2. `GITHUB_TOKEN` (GitHub Models)
//! 3. `OPENAI_API_KEY`
//! 4. `[provider]` table in the TOML config

use lineup_common::config::ProviderConfig;
use lineup_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

pub const AZURE_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4o-mini";
pub const GITHUB_MODELS_URL: &str = "https://models.github.ai/inference/chat/completions";
pub const GITHUB_MODELS_MODEL: &str = "openai/gpt-4o";
pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Chat-completions flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// `api-key` header, deployment in the URL, no model in the body
    Azure,
    /// Bearer token plus GitHub API headers
    GitHub,
    /// Bearer token
    OpenAi,
}

impl ProviderKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "azure" => Some(Self::Azure),
            "github" => Some(Self::GitHub),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Worker pool size when none is configured
    pub fn default_workers(&self) -> usize {
        match self {
            Self::Azure => 5,
            Self::GitHub | Self::OpenAi => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Azure => "Azure OpenAI",
            Self::GitHub => "GitHub Models",
            Self::OpenAi => "OpenAI",
        }
    }
}

/// Resolved provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Full chat-completions URL
    pub url: String,
    pub api_key: String,
    /// Model sent in the request body (`None` for Azure)
    pub model: Option<String>,
    pub timeout: Duration,
    pub requests_per_minute: Option<u32>,
    pub workers: usize,
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_key(v))
}

/// Azure deployment URL
pub fn azure_url(endpoint: &str, deployment: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        AZURE_API_VERSION
    )
}

/// Resolve provider settings
///
/// # Errors
/// `Error::Config` if no source yields usable credentials.
pub fn resolve_provider_settings(config: &ProviderConfig) -> Result<ProviderSettings> {
    let from_env = settings_from_env(config);
    let from_toml = settings_from_toml(config)?;

    if from_env.is_some() && from_toml.is_some() {
        warn!("Provider credentials found in environment and TOML. Using environment (highest priority).");
    }

    match from_env.or(from_toml) {
        Some(settings) => {
            info!(
                provider = settings.kind.label(),
                workers = settings.workers,
                "AI provider configured"
            );
            Ok(settings)
        }
        None => Err(Error::Config(
            "AI provider not configured. Please configure using one of:\n\
             1. Azure OpenAI: AZURE_OPENAI_KEY and AZURE_OPENAI_ENDPOINT (optional AZURE_OPENAI_DEPLOYMENT)\n\
             2. GitHub Models: GITHUB_TOKEN\n\
             3. OpenAI: OPENAI_API_KEY\n\
             4. TOML config: [provider] kind = \"azure\" | \"github\" | \"openai\", api_key = \"...\""
                .to_string(),
        )),
    }
}

fn settings_from_env(config: &ProviderConfig) -> Option<ProviderSettings> {
    let build = |kind: ProviderKind, url: String, api_key: String, model: Option<String>| {
        ProviderSettings {
            kind,
            url,
            api_key,
            model,
            timeout: Duration::from_secs(config.timeout_secs),
            requests_per_minute: config.requests_per_minute,
            workers: config.workers.unwrap_or_else(|| kind.default_workers()),
        }
    };

    if let (Some(key), Some(endpoint)) = (env_value("AZURE_OPENAI_KEY"), env_value("AZURE_OPENAI_ENDPOINT")) {
        let deployment = env_value("AZURE_OPENAI_DEPLOYMENT")
            .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string());
        info!("AI provider credentials loaded from AZURE_OPENAI_* environment variables");
        return Some(build(ProviderKind::Azure, azure_url(&endpoint, &deployment), key, None));
    }

    if let Some(token) = env_value("GITHUB_TOKEN") {
        info!("AI provider credentials loaded from GITHUB_TOKEN");
        return Some(build(
            ProviderKind::GitHub,
            GITHUB_MODELS_URL.to_string(),
            token,
            Some(GITHUB_MODELS_MODEL.to_string()),
        ));
    }

    if let Some(key) = env_value("OPENAI_API_KEY") {
        info!("AI provider credentials loaded from OPENAI_API_KEY");
        let model = config.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        return Some(build(ProviderKind::OpenAi, OPENAI_URL.to_string(), key, Some(model)));
    }

    None
}

fn settings_from_toml(config: &ProviderConfig) -> Result<Option<ProviderSettings>> {
    let Some(api_key) = config.api_key.clone().filter(|k| is_valid_key(k)) else {
        return Ok(None);
    };
    let kind_name = config.kind.as_deref().unwrap_or("openai");
    let kind = ProviderKind::parse(kind_name)
        .ok_or_else(|| Error::Config(format!("Unknown provider kind '{}'", kind_name)))?;

    let (url, model) = match kind {
        ProviderKind::Azure => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                Error::Config("[provider] kind = \"azure\" requires endpoint".to_string())
            })?;
            let deployment = config.model.as_deref().unwrap_or(DEFAULT_AZURE_DEPLOYMENT);
            (azure_url(endpoint, deployment), None)
        }
        ProviderKind::GitHub => (
            config.endpoint.clone().unwrap_or_else(|| GITHUB_MODELS_URL.to_string()),
            Some(config.model.clone().unwrap_or_else(|| GITHUB_MODELS_MODEL.to_string())),
        ),
        ProviderKind::OpenAi => (
            config.endpoint.clone().unwrap_or_else(|| OPENAI_URL.to_string()),
            Some(config.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())),
        ),
    };

    info!(provider = kind.label(), "AI provider credentials loaded from TOML config");
    Ok(Some(ProviderSettings {
        kind,
        url,
        api_key,
        model,
        timeout: Duration::from_secs(config.timeout_secs),
        requests_per_minute: config.requests_per_minute,
        workers: config.workers.unwrap_or_else(|| kind.default_workers()),
    }))
}

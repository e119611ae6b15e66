//! Provider capability

use crate::error::ProviderError;
use async_trait::async_trait;

/// One chat request: system instruction, user message and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Text-completion capability, decoupled from any vendor
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Send `prompt`, return the assistant's raw text
    ///
    /// # Errors
    /// Any [`ProviderError`]; callers treat every variant as "no data" for
    /// the artist at hand, with `RateLimited` additionally driving the
    /// batch's wait policy.
    async fn enrich(&self, prompt: &Prompt) -> Result<String, ProviderError>;

    /// Name for log lines
    fn name(&self) -> &str;
}

//! OpenAI-compatible chat-completions client
//!
//! One client covers Azure OpenAI, GitHub Models and OpenAI: they differ only
//! in URL, auth header and whether the model goes in the body.

use super::provider::{EnrichmentProvider, Prompt};
use crate::config::{ProviderKind, ProviderSettings};
use crate::error::ProviderError;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

/// Wait assumed when a 429 carries no usable Retry-After header
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions provider
pub struct ChatCompletionsProvider {
    http_client: Client,
    settings: ProviderSettings,
    /// Client-side pacing, present when `requests_per_minute` is configured
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ChatCompletionsProvider {
    /// Build a provider from resolved settings
    ///
    /// # Errors
    /// `ProviderError::NotConfigured` if the key is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let mut headers = header::HeaderMap::new();
        match settings.kind {
            ProviderKind::Azure => {
                let value = header::HeaderValue::from_str(&settings.api_key)
                    .map_err(|e| ProviderError::NotConfigured(format!("Invalid API key: {}", e)))?;
                headers.insert("api-key", value);
            }
            ProviderKind::GitHub | ProviderKind::OpenAi => {
                let value = header::HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
                    .map_err(|e| ProviderError::NotConfigured(format!("Invalid API key: {}", e)))?;
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        if settings.kind == ProviderKind::GitHub {
            headers.insert(
                header::ACCEPT,
                header::HeaderValue::from_static("application/vnd.github+json"),
            );
            headers.insert(
                "X-GitHub-Api-Version",
                header::HeaderValue::from_static("2022-11-28"),
            );
        }

        let http_client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        let rate_limiter = settings
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            http_client,
            settings,
            rate_limiter,
        })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

/// Seconds from a Retry-After header; HTTP-date forms fall back to the default
fn retry_after(headers: &header::HeaderMap) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[async_trait]
impl EnrichmentProvider for ChatCompletionsProvider {
    async fn enrich(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let request = ChatRequest {
            model: self.settings.model.as_deref(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        debug!(provider = self.name(), url = %self.settings.url, "Sending chat completion");
        let response = self
            .http_client
            .post(&self.settings.url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(response.headers());
            warn!(provider = self.name(), retry_after_secs = wait.as_secs(), "Rate limited");
            return Err(ProviderError::RateLimited { retry_after: wait });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))
    }

    fn name(&self) -> &str {
        self.settings.kind.label()
    }
}

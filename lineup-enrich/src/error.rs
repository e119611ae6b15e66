//! Error types for lineup-enrich
//!
//! Store and configuration failures use [`lineup_common::Error`]. The two
//! network boundaries get their own enums so callers can tell a rate limit
//! from a timeout from a malformed body.

use std::time::Duration;
use thiserror::Error;

/// AI provider call failure
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP 429; `retry_after` from the Retry-After header (60 s if absent)
    #[error("Rate limited (retry after {}s)", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Non-success HTTP status other than 429
    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Provider request timed out")]
    Timeout,

    /// Body was not a chat completion, or the content was not the expected JSON
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// No usable credentials or endpoint
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Page fetch failure
///
/// Never crosses into the merge layer: [`crate::fetch::PageSource::fetch`]
/// logs it and reports the page as unavailable.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

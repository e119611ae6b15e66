//! Festival page fetching
//!
//! Pages are fetched one at a time with a politeness delay between
//! requests. Failures are logged and reported as "no page"; they never
//! propagate into the merge layer.

use crate::error::FetchError;
use async_trait::async_trait;
use lineup_common::config::ScraperConfig;
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Source of raw HTML
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url`; `None` if the page could not be retrieved
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// HTTP page source with a minimum interval between requests
pub struct HttpFetcher {
    http_client: Client,
    /// Minimum time between two requests
    delay: Duration,
    /// Rate limiter (last request time)
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl HttpFetcher {
    /// Build a fetcher from scraper settings
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed (invalid user agent, TLS init).
    pub fn new(config: &ScraperConfig) -> lineup_common::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| lineup_common::Error::Config(format!("Invalid user agent: {}", e)))?,
        );

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| lineup_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            delay: Duration::from_millis(config.request_delay_ms),
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Sleep until `delay` has passed since the previous request
    async fn enforce_delay(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < self.delay {
                let sleep_duration = self.delay - elapsed;
                debug!(
                    sleep_ms = sleep_duration.as_millis(),
                    "Politeness delay before page fetch"
                );
                sleep(sleep_duration).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// Fetch with error detail
    pub async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        self.enforce_delay().await;
        debug!(url = %url, "Fetching page");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(url = %url, error = %e, "Page fetch failed");
                None
            }
        }
    }
}

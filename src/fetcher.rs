//! HTTP fetcher shared by all source jobs.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::cancel::JobToken;
use crate::config::HttpConfig;
use crate::error::HarvestError;
use crate::utils::format_bytes;

/// HTTP client with retry and size limits. One instance is shared by every
/// job of a run.
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
    max_response_bytes: usize,
}

impl Fetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::from_config(&HttpConfig::default())
    }

    pub fn from_config(http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(format!("ipharvest/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            max_retries: http.max_retries.max(1),
            retry_delay: Duration::from_millis(http.retry_delay_ms),
            max_response_bytes: http.max_response_bytes,
        })
    }

    /// Fetch a URL as text, retrying with exponential backoff.
    ///
    /// The token is checked before every attempt; a cancelled job stops at
    /// the next attempt boundary.
    pub async fn fetch_text(&self, url: &str, token: &JobToken) -> Result<String> {
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..self.max_retries {
            token.check()?;
            if attempt > 0 {
                let delay = self.retry_delay.saturating_mul(1 << (attempt - 1).min(16));
                debug!("Retry {} after {:?} for {}", attempt, delay, url);
                tokio::time::sleep(delay).await;
                token.check()?;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        last_error = Some(
                            HarvestError::Network(format!("HTTP {} from {}", response.status(), url))
                                .into(),
                        );
                        continue;
                    }

                    if let Some(content_length) = response.content_length() {
                        if content_length > self.max_response_bytes as u64 {
                            return Err(self.too_large(url).into());
                        }
                    }

                    let body = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url))?;

                    // Content-Length may be missing or wrong
                    if body.len() > self.max_response_bytes {
                        return Err(self.too_large(url).into());
                    }

                    debug!("Fetched {} ({})", url, format_bytes(body.len() as u64));
                    return Ok(body);
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context(format!("Request to {} failed", url)));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| HarvestError::Network(format!("No attempt made for {}", url)).into()))
    }

    fn too_large(&self, url: &str) -> HarvestError {
        HarvestError::ResponseTooLarge {
            url: url.to_string(),
            limit: format_bytes(self.max_response_bytes as u64),
        }
    }
}

// Default is not implemented because building the client can fail.

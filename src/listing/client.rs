//! HTTP client for listing pages using wreq for TLS fingerprint emulation.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with an error status.
    #[error("request failed with status: {0}")]
    Status(u16),
    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Transport failures are worth one retry; error statuses are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

/// Trait for fetching listing pages - enables mocking for tests.
#[async_trait]
pub trait PageFetch: Send + Sync {
    /// GETs `url` and returns the body text.
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Listing page client with browser impersonation and a shared session.
pub struct ShopClient {
    client: Client,
    user_agent: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl ShopClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Adds a random delay between page fetches.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl PageFetch for ShopClient {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en,zh;q=0.9")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status.as_u16() >= 400 {
            warn!("{} answered {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| FetchError::Transport(e.to_string()))
    }
}

//! Discord-style webhook notifier.

use super::Notifier;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use wreq::Client;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts `{"content": ...}` messages to a webhook URL.
pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .context("Failed to build webhook client")?;

        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, content: &str) -> Result<()> {
        let payload = serde_json::json!({ "content": content }).to_string();
        debug!("Posting {} chars to webhook", content.chars().count());

        let response = self
            .client
            .post(self.url.as_str())
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .context("Failed to reach webhook")?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            bail!("Webhook answered {}: {}", status, snippet);
        }

        Ok(())
    }
}

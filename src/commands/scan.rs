//! Scan command: one acquisition, extraction and reconciliation run.

use crate::config::Config;
use crate::expand::{ListingExpander, PageSnapshot};
use crate::format::{outcome_lines, Formatter};
use crate::listing::{reconcile, ListingParser, PageFetch, ScanOutcome, ShopClient};
use crate::notify::{deliver, DiscordWebhook, Notifier};
use crate::render::{self, Renderer};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Executes a single scan of the configured listing.
pub struct ScanCommand {
    config: Config,
}

impl ScanCommand {
    /// Creates a new scan command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one scan with real collaborators and returns formatted output.
    ///
    /// With `notify`, the report is also sent to the configured webhook.
    pub async fn execute(&self, notify: bool) -> Result<String> {
        let client = ShopClient::new(&self.config).context("Failed to create HTTP client")?;
        let renderer = render::detect(&self.config).await;

        let outcome = self.execute_with(renderer.as_deref(), &client).await;

        if let Some(renderer) = &renderer {
            if let Err(e) = renderer.shutdown().await {
                warn!("Failed to shut down renderer: {:#}", e);
            }
        }

        if notify {
            match webhook(&self.config)? {
                Some(webhook) => {
                    deliver(&webhook, &outcome_lines(&outcome)).await;
                }
                None => warn!("--notify given but no webhook is configured"),
            }
        }

        Ok(Formatter::new(self.config.format).format_outcome(&outcome))
    }

    /// Runs one scan with the provided collaborators (for testing and reuse).
    pub async fn execute_with(
        &self,
        renderer: Option<&dyn Renderer>,
        fetcher: &dyn PageFetch,
    ) -> ScanOutcome {
        info!("Scanning {}", self.config.start_url);

        let acquired =
            ListingExpander::new(&self.config, renderer, fetcher).acquire(&self.config.start_url).await;
        debug!("Acquired {} pages via {:?}", acquired.pages.len(), acquired.strategy);

        let outcome = outcome_from_pages(&acquired.pages);
        match &outcome {
            ScanOutcome::NothingCaptured => info!("No products captured"),
            ScanOutcome::NoDiscounts { captured } => {
                info!("Captured {} products, none discounted", captured)
            }
            ScanOutcome::Discounts(records) => info!("Found {} discounted products", records.len()),
        }
        outcome
    }
}

/// Builds the webhook notifier if one is configured.
pub fn webhook(config: &Config) -> Result<Option<DiscordWebhook>> {
    config.webhook_url.as_deref().map(DiscordWebhook::new).transpose()
}

/// Extracts, filters and reconciles the entries of every page.
pub fn outcome_from_pages(pages: &[PageSnapshot]) -> ScanOutcome {
    let mut captured = Vec::new();
    for page in pages {
        let parsed = ListingParser::new(&page.url).parse(&page.html);
        debug!("{}: {} entries from {} located nodes", page.url, parsed.entries.len(), parsed.located);
        captured.extend(parsed.entries);
    }

    let captured_count = captured.len();
    let discounted = captured.into_iter().filter(|e| e.has_pairs());

    ScanOutcome::from_reconciliation(captured_count, reconcile(discounted))
}

/// Runs the extraction pipeline over a saved HTML file.
pub fn parse_file(path: &Path, base_url: &str) -> Result<ScanOutcome> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read HTML file: {}", path.display()))?;

    Ok(outcome_from_pages(&[PageSnapshot { url: base_url.to_string(), html }]))
}

/// Sends an outcome's report lines through `notifier`.
pub async fn notify_outcome(notifier: &dyn Notifier, outcome: &ScanOutcome) -> usize {
    deliver(notifier, &outcome_lines(outcome)).await
}

//! Watch command: repeats the scan on a fixed interval until interrupted.

use super::scan::{notify_outcome, webhook, ScanCommand};
use crate::config::Config;
use crate::format::Formatter;
use crate::listing::{PageFetch, ScanOutcome, ShopClient};
use crate::notify::Notifier;
use crate::render::{self, Renderer};
use anyhow::{anyhow, Context, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, warn};

/// Scheduled scanning.
pub struct WatchCommand {
    scan: ScanCommand,
}

impl WatchCommand {
    /// Creates a new watch command.
    pub fn new(config: Config) -> Self {
        Self { scan: ScanCommand::new(config) }
    }

    /// Runs until Ctrl-C.
    pub async fn execute(&self) -> Result<()> {
        let config = self.scan.config();
        let client = ShopClient::new(config).context("Failed to create HTTP client")?;
        let renderer = render::detect(config).await;
        let notifier = webhook(config)?;
        let interval = config.interval();

        info!(
            "Watching {} every {}s (browser: {}, webhook: {})",
            config.start_url,
            interval.as_secs(),
            renderer.is_some(),
            notifier.is_some()
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        let runs = self
            .execute_with(
                renderer.as_deref(),
                &client,
                notifier.as_ref().map(|n| n as &dyn Notifier),
                interval,
                shutdown,
            )
            .await;

        if let Some(renderer) = &renderer {
            if let Err(e) = renderer.shutdown().await {
                warn!("Failed to shut down renderer: {:#}", e);
            }
        }

        info!("Stopped after {} runs", runs);
        Ok(())
    }

    /// Runs scan cycles until `shutdown` resolves and returns the number of
    /// runs started.
    pub async fn execute_with(
        &self,
        renderer: Option<&dyn Renderer>,
        fetcher: &dyn PageFetch,
        notifier: Option<&dyn Notifier>,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> u32 {
        tokio::pin!(shutdown);
        let mut runs = 0;

        loop {
            runs += 1;
            let cycle = async {
                if let Err(e) = self.run_once(renderer, fetcher, notifier).await {
                    error!("Run {} failed: {:#}", runs, e);
                }
                tokio::time::sleep(interval).await;
            };

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = cycle => {}
            }
        }

        runs
    }

    /// One scan plus report and notification. A panicking run becomes an error.
    async fn run_once(
        &self,
        renderer: Option<&dyn Renderer>,
        fetcher: &dyn PageFetch,
        notifier: Option<&dyn Notifier>,
    ) -> Result<ScanOutcome> {
        let outcome = AssertUnwindSafe(self.scan.execute_with(renderer, fetcher))
            .catch_unwind()
            .await
            .map_err(|_| anyhow!("scan panicked"))?;

        println!("{}", Formatter::new(self.scan.config().format).format_outcome(&outcome));

        if let Some(notifier) = notifier {
            notify_outcome(notifier, &outcome).await;
        }

        Ok(outcome)
    }
}

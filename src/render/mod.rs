//! Rendering-engine boundary for script-driven listings.
//!
//! The expander only needs a handful of primitives from a browser, so they
//! are modelled as a `Renderer` that opens `RenderSession`s. When no engine
//! is available the caller gets `None` from [`detect`] and crawls instead.

#[cfg(feature = "browser")]
pub mod chromium;

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// A browser engine that can open rendering sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh session (tab). The caller must close it.
    async fn open_session(&self) -> Result<Box<dyn RenderSession>>;

    /// Shuts the engine down.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// One rendering session with the primitives the expander relies on.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Navigates to `url` and waits for the document to attach.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluates a script and returns its JSON result (`Null` for undefined).
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Clicks the first visible, enabled control labelled `label`.
    ///
    /// Returns `false` when no such control exists.
    async fn click_control(&self, label: &str) -> Result<bool>;

    /// Waits briefly for the page to react.
    async fn settle(&self, pause: Duration) {
        tokio::time::sleep(pause).await;
    }

    /// Returns the current rendered markup.
    async fn content(&self) -> Result<String>;

    /// Releases the session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Returns a renderer if browser rendering is enabled and an engine starts.
pub async fn detect(config: &Config) -> Option<Box<dyn Renderer>> {
    if !config.browser {
        info!("Browser rendering disabled, listings will be crawled page by page");
        return None;
    }

    launch(config).await
}

#[cfg(feature = "browser")]
async fn launch(config: &Config) -> Option<Box<dyn Renderer>> {
    match chromium::ChromiumRenderer::launch(config).await {
        Ok(renderer) => Some(Box::new(renderer)),
        Err(e) => {
            tracing::warn!("Browser unavailable ({:#}), listings will be crawled page by page", e);
            None
        }
    }
}

#[cfg(not(feature = "browser"))]
async fn launch(_config: &Config) -> Option<Box<dyn Renderer>> {
    info!("Built without browser support, listings will be crawled page by page");
    None
}

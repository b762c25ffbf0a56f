//! Headless Chromium renderer using chromiumoxide.

use super::{RenderSession, Renderer};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Clicks the first visible, enabled control whose text, aria-label or title
/// contains the label, ignoring case and whitespace. Only buttons and links
/// are matched on their text. `__LABEL__` is replaced with a JSON string literal.
const CLICK_CONTROL: &str = r#"(() => {
    const squash = (s) => (s || '').replace(/\s+/g, '').toLowerCase();
    const wanted = squash(__LABEL__);
    const candidates = document.querySelectorAll('button, a, [role="button"], [aria-label], [title]');
    for (const el of candidates) {
        const textual = el.matches('button, a, [role="button"]');
        const text = textual ? squash(el.textContent) : '';
        const aria = squash(el.getAttribute('aria-label'));
        const title = squash(el.getAttribute('title'));
        if (!text.includes(wanted) && !aria.includes(wanted) && !title.includes(wanted)) continue;
        const visible = el.getClientRects().length > 0 && getComputedStyle(el).visibility !== 'hidden';
        const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
        if (!visible || !enabled) continue;
        el.scrollIntoView({ block: 'center' });
        el.click();
        return true;
    }
    return false;
})()"#;

/// Finds a Chrome or Chromium binary.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumRenderer {
    /// Launches a headless Chromium instance.
    pub async fn launch(config: &Config) -> Result<Self> {
        let chrome_path = find_chromium().context("Chromium not found. Install it or set CHROME_PATH.")?;
        debug!("Launching {}", chrome_path.display());

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1366, 900)
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", config.user_agent))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) =
            Browser::launch(browser_config).await.context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Chromium handler error: {e}");
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            navigation_timeout: Duration::from_secs(config.timeout_secs.max(4)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumSession { page, navigation_timeout: self.navigation_timeout }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await.context("failed to close Chromium");
        if closed.is_ok() {
            if let Err(e) = browser.wait().await {
                warn!("Chromium did not exit cleanly: {e}");
            }
        }
        self.handler.abort();
        closed.map(|_| ())
    }
}

/// A single Chromium page.
pub struct ChromiumSession {
    page: Page,
    navigation_timeout: Duration,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {:?}", self.navigation_timeout),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await.context("JS execution failed")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn click_control(&self, label: &str) -> Result<bool> {
        let literal = serde_json::to_string(label)?;
        let script = CLICK_CONTROL.replace("__LABEL__", &literal);
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("failed to read rendered HTML")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.context("failed to close page")?;
        Ok(())
    }
}

//! Expansion of script-driven listings inside a rendering session.

use super::state::{should_stop, ExpansionLimits, ExpansionState, StopReason};
use crate::render::{RenderSession, Renderer};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Labels of controls that append more entries.
pub const LOAD_MORE_LABELS: &[&str] = &["show more", "load more", "view more"];

/// Entry-count polling interval after a click.
pub(crate) const GROWTH_POLL: Duration = Duration::from_millis(250);
/// Longest wait for a click to add entries.
pub(crate) const GROWTH_WAIT: Duration = Duration::from_secs(4);
const SCROLL_SETTLE: Duration = Duration::from_millis(500);

pub(crate) const SCROLL_TO_END: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight; })()";

pub(crate) const DOCUMENT_HEIGHT: &str = "document.body ? document.body.scrollHeight : 0";

pub(crate) const ENTRY_COUNT: &str = r#"document.querySelectorAll('[data-product-id], [class*="product-card"], [class*="product-item"]').length"#;

/// Final state of a rendered listing.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub html: String,
    pub state: ExpansionState,
    pub reason: StopReason,
}

/// Drives a renderer until the listing stops growing.
pub struct DynamicExpander<'a> {
    renderer: &'a dyn Renderer,
    limits: ExpansionLimits,
}

impl<'a> DynamicExpander<'a> {
    pub fn new(renderer: &'a dyn Renderer, limits: ExpansionLimits) -> Self {
        Self { renderer, limits }
    }

    /// Renders `url`, expands it, and returns the final markup.
    ///
    /// The session is closed whether or not expansion succeeds.
    pub async fn expand(&self, url: &str) -> Result<Expansion> {
        let mut session =
            self.renderer.open_session().await.context("Failed to open render session")?;

        let result = self.drive(session.as_mut(), url).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close render session: {:#}", e);
        }

        result
    }

    async fn drive(&self, session: &mut dyn RenderSession, url: &str) -> Result<Expansion> {
        info!("Rendering {}", url);
        session.navigate(url).await.with_context(|| format!("Failed to open {}", url))?;

        let started = Instant::now();
        let mut state = ExpansionState::default();

        let reason = loop {
            let clicked = self.round(session, &mut state).await?;
            debug!(
                "Round {}: height={} entries={} stable={} clicked={}",
                state.round,
                state.document_height,
                state.rendered_entry_count,
                state.stable_rounds,
                clicked
            );

            if let Some(reason) = should_stop(&state, clicked, started.elapsed(), &self.limits) {
                break reason;
            }
        };

        info!(
            "Expansion stopped ({:?}) after {} rounds with {} entries",
            reason, state.round, state.rendered_entry_count
        );

        let html = session.content().await.context("Failed to read rendered listing")?;
        Ok(Expansion { html, state, reason })
    }

    /// One round: click, scroll, measure. Returns whether a control was clicked.
    async fn round(&self, session: &dyn RenderSession, state: &mut ExpansionState) -> Result<bool> {
        let clicked = click_load_more(session).await;
        if clicked {
            await_growth(session, state.rendered_entry_count).await;
        }

        session.evaluate(SCROLL_TO_END).await.context("Failed to scroll listing")?;
        session.settle(SCROLL_SETTLE).await;

        let height = as_count(&session.evaluate(DOCUMENT_HEIGHT).await?);
        let entries = as_count(&session.evaluate(ENTRY_COUNT).await?);
        state.record_round(height, entries);

        Ok(clicked)
    }
}

/// Click failures are not fatal; the round just counts as click-free.
async fn click_load_more(session: &dyn RenderSession) -> bool {
    for label in LOAD_MORE_LABELS {
        match session.click_control(label).await {
            Ok(true) => {
                debug!("Clicked \"{}\"", label);
                return true;
            }
            Ok(false) => {}
            Err(e) => debug!("Click on \"{}\" failed: {:#}", label, e),
        }
    }
    false
}

/// Waits until more than `before` entries are rendered or `GROWTH_WAIT` passes.
async fn await_growth(session: &dyn RenderSession, before: u64) {
    let polls = (GROWTH_WAIT.as_millis() / GROWTH_POLL.as_millis()) as u32;
    for _ in 0..polls {
        match session.evaluate(ENTRY_COUNT).await {
            Ok(count) if as_count(&count) > before => return,
            Ok(_) => {}
            Err(e) => {
                debug!("Entry count unavailable: {:#}", e);
                return;
            }
        }
        session.settle(GROWTH_POLL).await;
    }
    debug!("No new entries within {:?} of the click", GROWTH_WAIT);
}

fn as_count(value: &serde_json::Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|v| v.max(0.0) as u64))
        .unwrap_or(0)
}

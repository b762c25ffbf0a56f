//! Report delivery to chat webhooks.

pub mod discord;

pub use discord::DiscordWebhook;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Character budget for one chat message.
pub const MESSAGE_BUDGET: usize = 1800;

/// A destination for report messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message.
    async fn send(&self, content: &str) -> Result<()>;
}

/// Sends `lines` in budget-sized chunks and returns how many were delivered.
///
/// Failures are logged and skipped; nothing is retried.
pub async fn deliver(notifier: &dyn Notifier, lines: &[String]) -> usize {
    let chunks = chunk_lines(lines, MESSAGE_BUDGET);
    let mut delivered = 0;

    for chunk in &chunks {
        match notifier.send(chunk).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Notification failed: {:#}", e),
        }
    }

    debug!("Delivered {}/{} notification chunks", delivered, chunks.len());
    delivered
}

/// Packs newline-joined lines into chunks of at most `budget` characters.
///
/// Lines longer than the budget are split on character boundaries. Chunks
/// are trimmed and blank chunks are dropped.
pub fn chunk_lines(lines: &[String], budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0;

    for line in lines {
        for piece in split_long(line, budget) {
            let len = piece.chars().count();
            if !buf.is_empty() && buf_len + len + 1 > budget {
                push_trimmed(&mut chunks, &buf);
                buf.clear();
                buf_len = 0;
            }
            buf.push_str(&piece);
            buf.push('\n');
            buf_len += len + 1;
        }
    }
    push_trimmed(&mut chunks, &buf);

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, buf: &str) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_long(line: &str, budget: usize) -> Vec<String> {
    if line.chars().count() <= budget {
        return vec![line.to_string()];
    }

    let chars: Vec<char> = line.chars().collect();
    chars.chunks(budget).map(|c| c.iter().collect()).collect()
}

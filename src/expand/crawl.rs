//! Page-by-page crawl for listings that paginate server-side.

use crate::listing::locator::locate_entries;
use crate::listing::selectors::pagination;
use crate::listing::PageFetch;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Pause before the single retry of a transient failure.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// One fetched listing page and the URL it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// Why a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStop {
    PageLimit,
    FetchFailed,
    NotAListing,
    NoEntries,
    NoNextPage,
    Cycle,
}

#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub pages: Vec<PageSnapshot>,
    pub stop: CrawlStop,
}

/// Sequential crawler following next-page links.
pub struct StaticCrawler<'a> {
    fetcher: &'a dyn PageFetch,
    max_pages: usize,
    retry_delay: Duration,
}

impl<'a> StaticCrawler<'a> {
    pub fn new(fetcher: &'a dyn PageFetch, max_pages: usize) -> Self {
        Self { fetcher, max_pages, retry_delay: RETRY_DELAY }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Crawls from `start_url` until a stop condition is hit.
    ///
    /// Pages fetched before the stop are always kept.
    pub async fn crawl(&self, start_url: &str) -> CrawlResult {
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = Vec::new();
        let mut current = start_url.to_string();

        let stop = loop {
            if pages.len() >= self.max_pages {
                break CrawlStop::PageLimit;
            }
            if !visited.insert(current.clone()) {
                break CrawlStop::Cycle;
            }

            let Some(html) = self.fetch_with_retry(&current).await else {
                break CrawlStop::FetchFailed;
            };

            let inspection = inspect_page(&html, &current);
            if !inspection.is_listing {
                debug!("{} does not look like a listing", current);
                break CrawlStop::NotAListing;
            }
            if !inspection.has_entries {
                break CrawlStop::NoEntries;
            }

            pages.push(PageSnapshot { url: current.clone(), html });

            match inspection.next {
                None => break CrawlStop::NoNextPage,
                Some(next) if next == current => break CrawlStop::Cycle,
                Some(next) => current = next,
            }
        };

        info!("Crawled {} pages ({:?})", pages.len(), stop);
        CrawlResult { pages, stop }
    }

    /// Fetches once, retrying a single time after a transient failure.
    async fn fetch_with_retry(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(body) => Some(body),
            Err(e) if e.is_transient() => {
                warn!("Fetching {} failed ({}), retrying once", url, e);
                tokio::time::sleep(self.retry_delay).await;
                match self.fetcher.fetch(url).await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!("Giving up on {}: {}", url, e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Giving up on {}: {}", url, e);
                None
            }
        }
    }
}

struct PageInspection {
    is_listing: bool,
    has_entries: bool,
    next: Option<String>,
}

fn inspect_page(html: &str, url: &str) -> PageInspection {
    let document = Html::parse_document(html);

    let is_listing = document.root_element().text().any(|t| t.contains('$'))
        || document.select(&pagination::LISTING_MARKER).next().is_some();
    let has_entries = !locate_entries(&document).1.is_empty();

    PageInspection { is_listing, has_entries, next: next_page_url(&document, url) }
}

/// Finds the URL of the page after `current`.
///
/// Tries a `rel="next"` link, then a link mentioning "next", then bumps the
/// `page` query parameter (absent means page 1).
pub fn next_page_url(document: &Html, current: &str) -> Option<String> {
    let base = Url::parse(current).ok()?;

    let rel_next = document.select(&pagination::REL_LINK).find(|el| {
        el.value().attr("rel").is_some_and(|rel| rel.to_lowercase().contains("next"))
    });
    if let Some(href) = rel_next.and_then(|el| el.value().attr("href")) {
        if let Ok(url) = base.join(href.trim()) {
            return Some(url.to_string());
        }
    }

    let labelled_next = document.select(&pagination::CANDIDATE).find(mentions_next);
    if let Some(href) = labelled_next.and_then(|el| el.value().attr("href")) {
        if let Ok(url) = base.join(href.trim()) {
            return Some(url.to_string());
        }
    }

    bump_page_param(base)
}

/// Words a pagination control may use besides "next".
const NEXT_FILLER: &[&str] = &["go", "to", "the", "page", "results"];

/// True when the link text, aria-label or title reads as a next-page control
/// ("Next", "Next page »", "Go to next page"), not a name that merely contains
/// the word.
fn mentions_next(el: &ElementRef<'_>) -> bool {
    let text = el.text().collect::<String>();
    let labels = [Some(text.as_str()), el.value().attr("aria-label"), el.value().attr("title")];
    labels.into_iter().flatten().any(is_next_label)
}

fn is_next_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    let words: Vec<&str> =
        lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    words.contains(&"next") && words.iter().all(|w| *w == "next" || NEXT_FILLER.contains(w))
}

fn bump_page_param(mut url: Url) -> Option<String> {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    let page = match pairs.iter().find(|(k, _)| k == "page") {
        Some((_, v)) => v.trim().parse::<u64>().ok()?,
        None => 1,
    };
    let next = (page + 1).to_string();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        let mut replaced = false;
        for (k, v) in &pairs {
            if k != "page" {
                query.append_pair(k, v);
            } else if !replaced {
                query.append_pair("page", &next);
                replaced = true;
            }
        }
        if !replaced {
            query.append_pair("page", &next);
        }
    }

    Some(url.to_string())
}

//! Listing acquisition: render-and-expand when a renderer is available,
//! otherwise (or when rendering fails) crawl the paginated pages.

pub mod crawl;
pub mod dynamic;
pub mod state;

pub use crawl::{next_page_url, CrawlStop, PageSnapshot, StaticCrawler};
pub use dynamic::{DynamicExpander, Expansion};
pub use state::{should_stop, ExpansionLimits, ExpansionState, StopReason};

use crate::config::Config;
use crate::listing::PageFetch;
use crate::render::Renderer;
use std::time::Duration;
use tracing::{info, warn};

/// How the pages of a run were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Rendered,
    Crawled,
}

/// Pages acquired for one run.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub strategy: Strategy,
    pub pages: Vec<PageSnapshot>,
}

/// Picks and runs an acquisition strategy.
pub struct ListingExpander<'a> {
    renderer: Option<&'a dyn Renderer>,
    fetcher: &'a dyn PageFetch,
    limits: ExpansionLimits,
    max_pages: usize,
    retry_delay: Duration,
}

impl<'a> ListingExpander<'a> {
    pub fn new(
        config: &Config,
        renderer: Option<&'a dyn Renderer>,
        fetcher: &'a dyn PageFetch,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            limits: ExpansionLimits::from_config(config),
            max_pages: config.max_pages,
            retry_delay: crawl::RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Acquires the listing at `start_url`.
    ///
    /// A rendered listing yields a single snapshot even if it holds no
    /// entries. A rendering error falls back to the crawl.
    pub async fn acquire(&self, start_url: &str) -> Acquired {
        match self.renderer {
            Some(renderer) => match DynamicExpander::new(renderer, self.limits).expand(start_url).await
            {
                Ok(expansion) => {
                    return Acquired {
                        strategy: Strategy::Rendered,
                        pages: vec![PageSnapshot {
                            url: start_url.to_string(),
                            html: expansion.html,
                        }],
                    };
                }
                Err(e) => warn!("Rendering failed ({:#}), falling back to page crawl", e),
            },
            None => info!("No renderer available, crawling pages"),
        }

        let result = StaticCrawler::new(self.fetcher, self.max_pages)
            .with_retry_delay(self.retry_delay)
            .crawl(start_url)
            .await;

        Acquired { strategy: Strategy::Crawled, pages: result.pages }
    }
}

#[cfg(test)]
mod tests {
    use super::dynamic::tests::MockRenderer;
    use super::*;
    use crate::listing::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockFetcher {
        body: String,
        call_count: AtomicU32,
    }

    #[async_trait]
    impl PageFetch for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if url.contains("page=") {
                return Err(FetchError::Status(404));
            }
            Ok(self.body.clone())
        }
    }

    fn fetcher() -> MockFetcher {
        MockFetcher {
            body: r#"<div class="product-card"><a href="/p/1">One</a> $5 $9</div>"#.into(),
            call_count: AtomicU32::new(0),
        }
    }

    #[tokio::test]
    async fn test_renderer_used_when_available() {
        let renderer = MockRenderer::new(vec![800], 0);
        let fetcher = fetcher();
        let config = Config::default();

        let acquired = ListingExpander::new(&config, Some(&renderer), &fetcher)
            .acquire("https://shop.test/list")
            .await;

        assert_eq!(acquired.strategy, Strategy::Rendered);
        assert_eq!(acquired.pages.len(), 1);
        assert_eq!(acquired.pages[0].url, "https://shop.test/list");
        assert_eq!(fetcher.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_render_failure_falls_back_to_crawl() {
        let mut renderer = MockRenderer::new(vec![800], 0);
        renderer.fail_navigation = true;
        let fetcher = fetcher();
        let config = Config::default();

        let acquired = ListingExpander::new(&config, Some(&renderer), &fetcher)
            .with_retry_delay(Duration::ZERO)
            .acquire("https://shop.test/list")
            .await;

        assert_eq!(acquired.strategy, Strategy::Crawled);
        assert_eq!(acquired.pages.len(), 1);
        assert!(acquired.pages[0].html.contains("product-card"));
    }

    #[tokio::test]
    async fn test_no_renderer_crawls() {
        let fetcher = fetcher();
        let config = Config::default();

        let acquired = ListingExpander::new(&config, None, &fetcher)
            .with_retry_delay(Duration::ZERO)
            .acquire("https://shop.test/list")
            .await;

        assert_eq!(acquired.strategy, Strategy::Crawled);
        assert_eq!(acquired.pages.len(), 1);
    }
}

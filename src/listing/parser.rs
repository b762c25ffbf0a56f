//! Turns a rendered listing document into product entries.

use super::extractor::{extract_pairs, text_of};
use super::locator::{locate_entries, LocatorTier};
use super::models::ProductEntry;
use super::money::distinct_amounts;
use super::selectors::entry;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};
use url::Url;

/// Name used when an entry has no readable title.
pub const UNTITLED: &str = "(no title)";

/// Entries recovered from one document.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Selector tier the locator used
    pub tier: LocatorTier,
    /// Number of candidate nodes located
    pub located: usize,
    /// Captured entries: each has a URL and at least one amount
    pub entries: Vec<ProductEntry>,
}

impl ParsedPage {
    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parser for listing pages.
pub struct ListingParser {
    base: Option<Url>,
}

impl ListingParser {
    /// Creates a parser that resolves links against `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self { base: Url::parse(base_url).ok() }
    }

    /// Parses a document into captured entries, in document order.
    pub fn parse(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        let (tier, nodes) = locate_entries(&document);
        let located = nodes.len();

        let entries: Vec<_> = nodes.into_iter().filter_map(|node| self.parse_entry(node)).collect();

        debug!("Captured {} of {} located entries ({:?} tier)", entries.len(), located, tier);

        ParsedPage { tier, located, entries }
    }

    /// Builds an entry, or `None` if the node has no link or no amount at all.
    fn parse_entry(&self, element: ElementRef<'_>) -> Option<ProductEntry> {
        let link = element.select(&entry::LINK).find_map(|a| {
            let href = a.value().attr("href")?;
            self.resolve(href).map(|url| (a, url))
        });

        let Some((anchor, url)) = link else {
            trace!("Skipping entry without a usable link");
            return None;
        };

        let pairs = extract_pairs(element);
        if pairs.is_empty() && distinct_amounts(&text_of(element)).is_empty() {
            trace!("Skipping entry without prices: {}", url);
            return None;
        }

        let mut product = ProductEntry::new(self.entry_name(element, anchor), url);
        for pair in pairs {
            product.push_pair(pair);
        }

        Some(product)
    }

    /// Picks the link title, the link text, then a heading or title-ish node.
    fn entry_name(&self, element: ElementRef<'_>, anchor: ElementRef<'_>) -> String {
        let from_link = anchor
            .value()
            .attr("title")
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(anchor));

        if !from_link.is_empty() {
            return from_link;
        }

        element
            .select(&entry::NAME)
            .map(text_of)
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Resolves an href to an absolute http(s) URL.
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }

        let url = match &self.base {
            Some(base) => base.join(href).ok()?,
            None => Url::parse(href).ok()?,
        };

        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.test/en-CA/search?keywords=shell";

    #[test]
    fn test_parse_entry_fields() {
        let parser = ListingParser::new(BASE);
        let page = parser.parse(
            r#"<html><body>
                <div class="product-card">
                    <a href="/p/alpha-jacket" title="Alpha Jacket"><img src="a.jpg"></a>
                    <span class="sale">$59.99</span>
                    <span class="regular">$89.99</span>
                </div>
            </body></html>"#,
        );

        assert_eq!(page.tier, LocatorTier::Product);
        assert_eq!(page.located, 1);
        assert_eq!(page.entries.len(), 1);

        let entry = &page.entries[0];
        assert_eq!(entry.name, "Alpha Jacket");
        assert_eq!(entry.url, "https://shop.test/p/alpha-jacket");
        assert_eq!(entry.pairs.len(), 1);
        assert_eq!(entry.pairs[0].current().get(), 5999);
    }

    #[test]
    fn test_name_falls_back_to_link_text_then_heading() {
        let parser = ListingParser::new(BASE);
        let page = parser.parse(
            r#"<html><body>
                <div class="product-tile"><a href="/p/1">Beta Pant</a>$10 $20</div>
                <div class="product-tile"><a href="/p/2"><img></a><h3>Gamma Hoody</h3>$10</div>
                <div class="product-tile"><a href="/p/3"></a>$10</div>
            </body></html>"#,
        );

        let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Beta Pant", "Gamma Hoody", UNTITLED]);
    }

    #[test]
    fn test_entries_without_link_or_amount_are_not_captured() {
        let parser = ListingParser::new(BASE);
        let page = parser.parse(
            r#"<html><body>
                <div class="product-card">No link $10 $20</div>
                <div class="product-card"><a href="/p/1">No price</a></div>
                <div class="product-card"><a href="javascript:void(0)">Script</a>$10 $20</div>
                <div class="product-card"><a href="/p/2">Single price</a>$10</div>
            </body></html>"#,
        );

        assert_eq!(page.located, 4);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].url, "https://shop.test/p/2");
        assert!(!page.entries[0].has_pairs());
    }

    #[test]
    fn test_absolute_links_kept() {
        let parser = ListingParser::new(BASE);
        let page = parser.parse(
            r#"<div class="product-item"><a href="https://cdn.shop.test/p/9?c=red">X</a>$1 $2</div>"#,
        );
        assert_eq!(page.entries[0].url, "https://cdn.shop.test/p/9?c=red");
    }

    #[test]
    fn test_invalid_base_requires_absolute_links() {
        let parser = ListingParser::new("not a url");
        let page = parser.parse(
            r#"<div class="product-item"><a href="/p/1">Rel</a>$1 $2</div>
               <div class="product-item"><a href="https://x/y">Abs</a>$1 $2</div>"#,
        );
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].url, "https://x/y");
    }

    #[test]
    fn test_empty_document() {
        let parser = ListingParser::new(BASE);
        let page = parser.parse("");
        assert!(page.is_empty());
    }
}

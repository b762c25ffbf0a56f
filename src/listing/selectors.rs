//! CSS selectors for locating entries and prices on listing pages.
//!
//! Retail platforms rarely agree on markup, so these are deliberately broad
//! class-name fragments rather than exact classes. Update this file when a
//! target page stops matching, and add a fixture for it.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors used to find product entries.
pub mod entry {
    use super::*;

    /// Product-specific entry markers.
    pub static PRODUCT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[class*='product-card'], \
             [class*='product-tile'], \
             [class*='product-item'], \
             [data-product-id], \
             [data-sku], \
             li[class*='product'], \
             article[class*='product']",
        )
        .unwrap()
    });

    /// Generic containers, used only when no product marker matches.
    pub static GENERIC: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li, article, div").unwrap());

    /// First link inside an entry.
    pub static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

    /// Name fallback when the link carries no text.
    pub static NAME: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("h1, h2, h3, [class*='title'], [class*='name']").unwrap()
    });
}

/// Selectors for price fragments inside an entry.
pub mod price {
    use super::*;

    /// Nodes carrying the sale / current price.
    pub static SALE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[class*='sale'], \
             [class*='now'], \
             [class*='current'], \
             [class*='special'], \
             [data-sale-price]",
        )
        .unwrap()
    });

    /// Nodes carrying the regular / original price.
    pub static REGULAR: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[class*='regular'], \
             [class*='compare'], \
             [class*='was'], \
             [class*='original'], \
             [class*='strike'], \
             [data-regular-price], \
             del, \
             s",
        )
        .unwrap()
    });

    /// Attributes holding a bare sale amount.
    pub const SALE_ATTRS: &[&str] = &["data-sale-price"];

    /// Attributes holding a bare regular amount.
    pub const REGULAR_ATTRS: &[&str] = &["data-regular-price"];

    /// Price-labelled blocks.
    pub static BLOCK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[class*='price'], \
             [class*='pricing'], \
             [data-price]",
        )
        .unwrap()
    });

    /// Words that mark a price block as showing a discount.
    pub const DISCOUNT_KEYWORDS: &[&str] =
        &["sale", "was", "now", "regular", "compare", "original", "reg."];
}

/// Selectors used by the static crawl.
pub mod pagination {
    use super::*;

    /// Links and head links with a `rel` attribute.
    pub static REL_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[rel][href], link[rel][href]").unwrap());

    /// Anchors inspected for "next" wording.
    pub static CANDIDATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

    /// Any sign that a page is a product listing at all.
    pub static LISTING_MARKER: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("[data-product-id], [class*='product']").unwrap()
    });
}

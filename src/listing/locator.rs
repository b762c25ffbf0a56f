//! Entry locator: finds the repeating product nodes in a document.

use super::selectors::entry;
use scraper::{ElementRef, Html};
use tracing::debug;

/// Which selector tier produced the entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorTier {
    /// Product-specific markers matched.
    Product,
    /// Nothing product-specific matched; generic containers were used.
    Generic,
}

/// Returns the nodes most likely to be product entries, in document order.
///
/// Product-specific markers win. Only when none match does the locator fall
/// back to every `li`, `article` and `div`, which is known to pick up
/// non-product nodes; those usually drop out later for lack of a link or price.
pub fn locate_entries(document: &Html) -> (LocatorTier, Vec<ElementRef<'_>>) {
    let specific: Vec<_> = document.select(&entry::PRODUCT).collect();
    if !specific.is_empty() {
        debug!("Located {} entries by product markers", specific.len());
        return (LocatorTier::Product, specific);
    }

    let generic: Vec<_> = document.select(&entry::GENERIC).collect();
    debug!("No product markers, falling back to {} generic containers", generic.len());
    (LocatorTier::Generic, generic)
}

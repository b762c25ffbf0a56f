//! Deduplication, best-pair selection, and ranking of entries.

use super::models::{DiscountRecord, PricePair, ProductEntry};
use std::collections::HashSet;
use tracing::debug;

/// Result of reconciling one run's entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The input was empty or every entry was discarded.
    NothingFound,
    /// Records ranked by absolute discount, largest first. Never empty.
    Ranked(Vec<DiscountRecord>),
}

impl Reconciliation {
    /// Returns the ranked records, or an empty slice.
    pub fn records(&self) -> &[DiscountRecord] {
        match self {
            Reconciliation::NothingFound => &[],
            Reconciliation::Ranked(records) => records,
        }
    }
}

/// What one run reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Nothing with a link and a price was captured.
    NothingCaptured,
    /// Entries were captured but none showed a discount.
    NoDiscounts { captured: usize },
    /// Ranked discounted products. Never empty.
    Discounts(Vec<DiscountRecord>),
}

impl ScanOutcome {
    /// Combines the number of captured entries with the reconciled result.
    pub fn from_reconciliation(captured: usize, reconciliation: Reconciliation) -> Self {
        match reconciliation {
            Reconciliation::Ranked(records) => ScanOutcome::Discounts(records),
            Reconciliation::NothingFound if captured == 0 => ScanOutcome::NothingCaptured,
            Reconciliation::NothingFound => ScanOutcome::NoDiscounts { captured },
        }
    }

    pub fn records(&self) -> &[DiscountRecord] {
        match self {
            ScanOutcome::Discounts(records) => records,
            _ => &[],
        }
    }
}

/// Reconciles entries gathered from one run.
///
/// The first entry seen for a URL wins, even if a later duplicate carries a
/// bigger discount. Within an entry the largest absolute discount wins, and
/// earlier pairs win ties. The final sort is stable.
pub fn reconcile(entries: impl IntoIterator<Item = ProductEntry>) -> Reconciliation {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates = 0usize;

    for entry in entries {
        if entry.url.is_empty() {
            continue;
        }
        if !seen.insert(entry.url.clone()) {
            duplicates += 1;
            continue;
        }

        if let Some(pair) = best_pair(&entry.pairs) {
            records.push(DiscountRecord::new(entry.name, entry.url, pair));
        }
    }

    debug!("Reconciled {} records ({} duplicate entries dropped)", records.len(), duplicates);

    if records.is_empty() {
        return Reconciliation::NothingFound;
    }

    records.sort_by(|a, b| b.discount().cmp(&a.discount()));
    Reconciliation::Ranked(records)
}

/// Largest absolute discount; the earliest pair wins ties.
fn best_pair(pairs: &[PricePair]) -> Option<PricePair> {
    pairs.iter().copied().fold(None, |best, pair| match best {
        Some(b) if b.discount() >= pair.discount() => Some(b),
        _ => Some(pair),
    })
}

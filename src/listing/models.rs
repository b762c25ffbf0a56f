//! Data models for listing entries, price pairs, and discount records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An exact amount of money in minor currency units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    /// Returns the raw number of cents.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A candidate (current, original) price pair for one entry.
///
/// Only constructible through [`PricePair::new`], which rejects anything
/// that is not a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PricePair {
    current: Cents,
    original: Cents,
}

impl PricePair {
    /// Creates a pair if `current` is strictly below `original`.
    pub fn new(current: Cents, original: Cents) -> Option<Self> {
        (current < original).then_some(Self { current, original })
    }

    /// Sale price.
    pub fn current(&self) -> Cents {
        self.current
    }

    /// Price before the discount.
    pub fn original(&self) -> Cents {
        self.original
    }

    /// Absolute discount.
    pub fn discount(&self) -> Cents {
        Cents(self.original.0 - self.current.0)
    }

    /// Discount as a percentage of the original price.
    pub fn discount_pct(&self) -> f64 {
        self.discount().0 as f64 / self.original.0 as f64 * 100.0
    }
}

/// One located product entry with every plausible price pair found for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductEntry {
    /// Display name
    pub name: String,
    /// Absolute product URL, the deduplication key
    pub url: String,
    /// Candidate pairs in discovery order, without duplicates
    pub pairs: Vec<PricePair>,
}

impl ProductEntry {
    /// Creates an entry with no pairs yet.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into(), pairs: Vec::new() }
    }

    /// Adds a pair unless it is already present.
    pub fn push_pair(&mut self, pair: PricePair) {
        if !self.pairs.contains(&pair) {
            self.pairs.push(pair);
        }
    }

    /// Returns true if at least one pair was found.
    pub fn has_pairs(&self) -> bool {
        !self.pairs.is_empty()
    }
}

/// The best discount chosen for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountRecord {
    /// Product name
    pub name: String,
    /// Product URL
    pub url: String,
    /// Sale price
    #[serde(rename = "current_cents")]
    pub current: Cents,
    /// Price before the discount
    #[serde(rename = "original_cents")]
    pub original: Cents,
    /// `(original - current) / original * 100`
    pub discount_pct: f64,
}

impl DiscountRecord {
    /// Builds a record from an entry's name and URL and the chosen pair.
    pub fn new(name: impl Into<String>, url: impl Into<String>, pair: PricePair) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            current: pair.current(),
            original: pair.original(),
            discount_pct: pair.discount_pct(),
        }
    }

    /// Absolute discount in cents.
    pub fn discount(&self) -> Cents {
        Cents(self.original.0.saturating_sub(self.current.0))
    }
}

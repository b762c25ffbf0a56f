//! Price-pair extraction for a single entry.
//!
//! Each heuristic is a pure function from an entry node to the pairs it can
//! justify. The page-authored heuristics run first and their results are
//! unioned; the blunt min/max guess only runs when they find nothing.

use super::models::{Cents, PricePair};
use super::money::{amounts_in_order, distinct_amounts, parse_amount};
use super::selectors::price;
use scraper::{ElementRef, Selector};
use std::collections::BTreeSet;

/// A single pairing heuristic.
pub type Heuristic = fn(ElementRef<'_>) -> Vec<PricePair>;

/// Heuristics that rely on the page's own price markup, in priority order.
pub const PRIMARY: &[Heuristic] = &[semantic_pairs, keyword_pairs];

/// Heuristic used when the markup is too irregular for the primary ones.
pub const FALLBACK: Heuristic = min_max_pair;

/// Returns every plausible pair for an entry, first-found first.
pub fn extract_pairs(element: ElementRef<'_>) -> Vec<PricePair> {
    let mut pairs: Vec<PricePair> = Vec::new();

    for heuristic in PRIMARY {
        for pair in heuristic(element) {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }

    if pairs.is_empty() {
        pairs = FALLBACK(element);
    }

    pairs
}

/// Pairs sale-marked amounts with regular-marked amounts.
pub fn semantic_pairs(element: ElementRef<'_>) -> Vec<PricePair> {
    let sale = marked_amounts(element, &price::SALE, price::SALE_ATTRS);
    let regular = marked_amounts(element, &price::REGULAR, price::REGULAR_ATTRS);

    sale.iter()
        .flat_map(|&current| regular.iter().filter_map(move |&original| PricePair::new(current, original)))
        .collect()
}

/// Pairs adjacent amounts inside price blocks that mention a discount.
pub fn keyword_pairs(element: ElementRef<'_>) -> Vec<PricePair> {
    let mut pairs = Vec::new();

    for block in element.select(&price::BLOCK) {
        let text = text_of(block);
        let lower = text.to_lowercase();
        if !price::DISCOUNT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            continue;
        }

        let amounts = amounts_in_order(&text);
        for window in amounts.windows(2) {
            if let Some(pair) = PricePair::new(window[0], window[1]) {
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
    }

    pairs
}

/// Pairs the lowest and highest amount anywhere in the entry.
pub fn min_max_pair(element: ElementRef<'_>) -> Vec<PricePair> {
    let amounts = distinct_amounts(&text_of(element));
    match (amounts.first(), amounts.last()) {
        (Some(&min), Some(&max)) => PricePair::new(min, max).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Collects amounts from matching nodes' text and bare-amount attributes.
fn marked_amounts(element: ElementRef<'_>, selector: &Selector, attrs: &[&str]) -> BTreeSet<Cents> {
    let mut amounts = BTreeSet::new();

    for attr in attrs {
        if let Some(amount) = element.value().attr(attr).and_then(parse_amount) {
            amounts.insert(amount);
        }
    }

    for node in element.select(selector) {
        amounts.extend(distinct_amounts(&text_of(node)));
        for attr in attrs {
            if let Some(amount) = node.value().attr(attr).and_then(parse_amount) {
                amounts.insert(amount);
            }
        }
    }

    amounts
}

/// Whitespace-normalised text content of a node.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

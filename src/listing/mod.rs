//! Listing extraction: money parsing, entry location, price pairing and reconciliation.

pub mod client;
pub mod extractor;
pub mod locator;
pub mod models;
pub mod money;
pub mod parser;
pub mod reconcile;
pub mod selectors;

pub use client::{FetchError, PageFetch, ShopClient};
pub use models::{Cents, DiscountRecord, PricePair, ProductEntry};
pub use parser::{ListingParser, ParsedPage};
pub use reconcile::{reconcile, Reconciliation, ScanOutcome};

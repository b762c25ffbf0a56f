//! sale-scout - watches a retail search-results page and reports the products
//! priced below their original price.
//!
//! Listings are acquired by rendering and expanding them in a headless browser
//! when one is available, or by crawling their paginated pages otherwise.

pub mod commands;
pub mod config;
pub mod expand;
pub mod format;
pub mod listing;
pub mod notify;
pub mod render;

pub use config::Config;
pub use listing::models::{Cents, DiscountRecord, PricePair, ProductEntry};
pub use listing::ScanOutcome;

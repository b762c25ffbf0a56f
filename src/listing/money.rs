//! Monetary amount recovery from free text and attribute values.
//!
//! Amounts are always dollar-marked in free text (`$59.99`, `C$ 1,234.00`).
//! Thousands separators are stripped before the fractional part is read,
//! and the fractional part is truncated or right-padded to exactly two
//! digits, never rounded.

use super::models::Cents;
use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Dollar-marked amount inside free text.
static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:[.,]([0-9]+))?").unwrap()
});

/// A bare number as found in `data-*` price attributes.
static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:[.,]([0-9]+))?$").unwrap()
});

/// Returns every amount in `text`, in the order they appear (duplicates kept).
pub fn amounts_in_order(text: &str) -> Vec<Cents> {
    MONEY
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(1)?.as_str();
            to_cents(whole, caps.get(2).map(|m| m.as_str()))
        })
        .collect()
}

/// Returns the distinct amounts in `text`, ordered by value.
pub fn distinct_amounts(text: &str) -> BTreeSet<Cents> {
    amounts_in_order(text).into_iter().collect()
}

/// Parses a single attribute value such as `59.99`, `$59.99` or `1,234`.
pub fn parse_amount(raw: &str) -> Option<Cents> {
    let cleaned = raw.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim_start();
    let cleaned = cleaned.strip_prefix('$').unwrap_or(cleaned).trim();

    let caps = BARE_NUMBER.captures(cleaned)?;
    to_cents(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
}

/// Converts the integer and optional fractional digits to cents.
fn to_cents(whole: &str, fraction: Option<&str>) -> Option<Cents> {
    let dollars: u64 = whole.replace(',', "").parse().ok()?;

    let cents = match fraction {
        Some(digits) => {
            let mut two: String = digits.chars().take(2).collect();
            while two.len() < 2 {
                two.push('0');
            }
            two.parse::<u64>().ok()?
        }
        None => 0,
    };

    dollars.checked_mul(100)?.checked_add(cents).map(Cents)
}

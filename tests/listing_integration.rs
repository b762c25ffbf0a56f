//! Integration tests for the extraction pipeline using fixture files.

use sale_scout::commands::scan::{outcome_from_pages, parse_file};
use sale_scout::config::OutputFormat;
use sale_scout::expand::{next_page_url, PageSnapshot};
use sale_scout::format::Formatter;
use sale_scout::listing::locator::LocatorTier;
use sale_scout::listing::{Cents, ListingParser, ScanOutcome};
use scraper::Html;
use std::path::Path;

const LISTING_FIXTURE: &str = include_str!("fixtures/listing.html");
const BASE: &str = "https://www.example-shop.test/en-CA/search?keywords=arc%27teryx";

fn fixture_outcome() -> ScanOutcome {
    outcome_from_pages(&[PageSnapshot { url: BASE.to_string(), html: LISTING_FIXTURE.to_string() }])
}

#[test]
fn test_parse_listing_fixture() {
    let page = ListingParser::new(BASE).parse(LISTING_FIXTURE);

    assert_eq!(page.tier, LocatorTier::Product);
    // The card without a link is not captured
    assert_eq!(page.located, 8);
    assert_eq!(page.entries.len(), 7);

    let first = &page.entries[0];
    assert_eq!(first.name, "Beta LT Jacket Men's");
    assert_eq!(first.url, "https://www.example-shop.test/en-CA/p-beta-lt-jacket-men/12345");
    assert!(first.has_pairs());

    let with_pairs = page.entries.iter().filter(|e| e.has_pairs()).count();
    assert_eq!(with_pairs, 5);
}

#[test]
fn test_fixture_ranking() {
    let outcome = fixture_outcome();
    let records = outcome.records();

    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Beta LT Jacket Men's", "Atom Hoody Men's", "Cerium Vest", "Bird Word Cap"]
    );

    // First occurrence of a URL wins over the later clearance duplicate
    assert_eq!(records[0].current, Cents(37999));
    assert_eq!(records[0].original, Cents(54999));

    assert_eq!(records[1].current, Cents(12999));
    assert_eq!(records[2].current, Cents(9900));
    assert_eq!(records[2].original, Cents(14000));
    assert_eq!(records[3].original, Cents(6000));
}

#[test]
fn test_fixture_text_report() {
    let output = Formatter::new(OutputFormat::Text).format_outcome(&fixture_outcome());

    assert!(output.starts_with("Found 4 products priced below their original price:\n\n"));
    assert!(output.contains(" 1. Beta LT Jacket Men's\n    Now: $379.99 | Was: $549.99 | -31%\n"));
    assert!(output.contains(
        "    Source: https://www.example-shop.test/en-CA/p-cerium-vest/34567\n"
    ));
    assert!(output.ends_with("\n\n"));
}

#[test]
fn test_fixture_next_page() {
    let document = Html::parse_document(LISTING_FIXTURE);
    assert_eq!(
        next_page_url(&document, BASE).as_deref(),
        Some("https://www.example-shop.test/en-CA/search?keywords=arc%27teryx&page=2")
    );
}

#[test]
fn test_parse_file_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/listing.html");
    let outcome = parse_file(&path, BASE).unwrap();
    assert_eq!(outcome.records().len(), 4);
}

#[test]
fn test_generic_containers_fallback() {
    let html = r#"
        <html>
        <body>
            <ul>
                <li><a href="/deal/1">Trail Runner</a> Sale $89.00 Reg. $120.00</li>
                <li><a href="/deal/2">Camp Mug</a> $12.00</li>
            </ul>
        </body>
        </html>
    "#;

    let page = ListingParser::new("https://shop.test/").parse(html);
    assert_eq!(page.tier, LocatorTier::Generic);

    let outcome = outcome_from_pages(&[PageSnapshot {
        url: "https://shop.test/".to_string(),
        html: html.to_string(),
    }]);
    let records = outcome.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://shop.test/deal/1");
    assert_eq!(records[0].discount(), Cents(3100));
}

#[test]
fn test_page_without_prices() {
    let html = r#"
        <html>
        <body>
            <div class="product-card"><a href="/p/1">Sold out</a></div>
        </body>
        </html>
    "#;

    let outcome = outcome_from_pages(&[PageSnapshot {
        url: "https://shop.test/".to_string(),
        html: html.to_string(),
    }]);
    assert_eq!(outcome, ScanOutcome::NothingCaptured);
}

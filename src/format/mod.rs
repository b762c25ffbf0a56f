//! Output formatting for scan reports (text, JSON, CSV).

use crate::config::OutputFormat;
use crate::listing::{Cents, DiscountRecord, ScanOutcome};

/// Reported when no entry with a link and a price was found.
pub const NOTHING_CAPTURED: &str = "No products were captured (the page may be script-rendered, \
                                    blocked by anti-bot measures, or restructured).";

/// Reported when entries were found but none was discounted.
pub const NO_DISCOUNTS: &str = "No products priced below their original price were found.";

/// Formats scan outcomes for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a run's outcome.
    pub fn format_outcome(&self, outcome: &ScanOutcome) -> String {
        match self.format {
            OutputFormat::Text => outcome_lines(outcome).join("\n"),
            OutputFormat::Json => self.json_records(outcome.records()),
            OutputFormat::Csv => self.csv_records(outcome.records()),
        }
    }

    // JSON formatting

    fn json_records(&self, records: &[DiscountRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "name,url,current,original,discount_pct".to_string()
    }

    fn csv_records(&self, records: &[DiscountRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for record in records {
            lines.push(format!(
                "{},{},{},{},{:.2}",
                Self::csv_escape(&record.name),
                Self::csv_escape(&record.url),
                decimal(record.current),
                decimal(record.original),
                record.discount_pct
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Text report lines for an outcome; also what the notifier sends.
pub fn outcome_lines(outcome: &ScanOutcome) -> Vec<String> {
    match outcome {
        ScanOutcome::NothingCaptured => vec![NOTHING_CAPTURED.to_string()],
        ScanOutcome::NoDiscounts { .. } => vec![NO_DISCOUNTS.to_string()],
        ScanOutcome::Discounts(records) => report_lines(records),
    }
}

/// Lines of the ranked discount report.
pub fn report_lines(records: &[DiscountRecord]) -> Vec<String> {
    let mut lines = vec![
        format!("Found {} products priced below their original price:", records.len()),
        String::new(),
    ];

    for (i, record) in records.iter().enumerate() {
        lines.push(format!("{:>2}. {}", i + 1, record.name));
        lines.push(format!(
            "    Now: {} | Was: {} | -{:.0}%",
            record.current, record.original, record.discount_pct
        ));
        lines.push(format!("    Source: {}", record.url));
        lines.push(String::new());
    }

    lines.push(String::new());
    lines
}

fn decimal(amount: Cents) -> String {
    format!("{}.{:02}", amount.get() / 100, amount.get() % 100)
}

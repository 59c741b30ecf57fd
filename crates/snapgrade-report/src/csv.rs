//! CSV export.
//!
//! Every field is wrapped in double quotes; embedded quotes are not escaped.
//! Rows are joined by `\n` with no trailing newline.

use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use snapgrade_core::model::Test;
use snapgrade_core::results::ScanResult;

pub const HEADERS: [&str; 8] = [
    "Student Name",
    "Student ID",
    "Score",
    "Percentage",
    "Correct",
    "Incorrect",
    "Status",
    "Scanned At",
];

const SCANNED_AT_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Generate the CSV export with timestamps in local time.
pub fn generate_csv(test: &Test, results: &[ScanResult]) -> String {
    generate_csv_in(test, results, &Local)
}

/// Generate the CSV export with timestamps rendered in `tz`.
pub fn generate_csv_in<Tz>(test: &Test, results: &[ScanResult], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(quote_row(HEADERS.iter().map(|h| h.to_string())));

    for r in results {
        let status = if r.percentage >= test.passing_score {
            "Pass"
        } else {
            "Fail"
        };
        let scanned_at = r
            .scanned_at
            .with_timezone(tz)
            .format(SCANNED_AT_FORMAT)
            .to_string();
        rows.push(quote_row([
            r.student_name.clone(),
            r.student_id.clone(),
            r.correct_count.to_string(),
            r.percentage.to_string(),
            r.correct_count.to_string(),
            r.incorrect_count.to_string(),
            status.to_string(),
            scanned_at,
        ]));
    }

    rows.join("\n")
}

fn quote_row(fields: impl IntoIterator<Item = String>) -> String {
    fields
        .into_iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write the CSV export to a file.
pub fn write_csv_report(test: &Test, results: &[ScanResult], path: &Path) -> Result<()> {
    crate::write_document(path, &generate_csv(test, results))
        .with_context(|| format!("failed to write CSV to {}", path.display()))
}

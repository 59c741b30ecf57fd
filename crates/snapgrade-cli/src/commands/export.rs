//! The `snapgrade export` command.

use std::path::PathBuf;

use anyhow::Result;

use snapgrade_core::report::GradingReport;
use snapgrade_core::traits::TestRepository;
use snapgrade_report::csv::write_csv_report;
use snapgrade_report::default_file_name;
use snapgrade_report::html::write_html_report;

use super::Workspace;

pub async fn execute(
    test_id: String,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "csv" | "json" | "html"),
        "unknown format '{format}' (expected csv, json or html)"
    );

    let ws = Workspace::open(config_path).await?;
    let test = ws.require_test(&test_id).await?;
    let results = ws.repository.load_results(&test_id).await?;
    anyhow::ensure!(
        !results.is_empty(),
        "no results to export for test '{test_id}'"
    );

    let path = output.unwrap_or_else(|| PathBuf::from(default_file_name(&test.title, &format)));
    let count = results.len();

    match format.as_str() {
        "csv" => write_csv_report(&test, &results, &path)?,
        "json" => GradingReport::build(&test, results).save_json(&path)?,
        _ => write_html_report(&GradingReport::build(&test, results), &path)?,
    }

    println!(
        "Exported {count} result(s) as {} to {}",
        format.to_uppercase(),
        path.display()
    );
    Ok(())
}

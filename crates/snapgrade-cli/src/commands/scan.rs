//! The `snapgrade scan` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use snapgrade_core::engine::{BatchOutcome, GradingEngine, ProgressReporter};
use snapgrade_core::results::ScanResult;
use snapgrade_core::traits::SheetImage;
use snapgrade_recognition::create_recognizer;

use super::Workspace;

/// Console progress reporter.
pub(crate) struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_sheet_start(&self, file_name: &str, attempt: u32) {
        if attempt > 1 {
            eprintln!("  Retrying: {file_name} (attempt {attempt})");
        }
    }

    fn on_sheet_graded(&self, file_name: &str, result: &ScanResult) {
        eprintln!(
            "  Graded: {file_name} -> {} {}/{} ({}%)",
            result.student_name,
            result.correct_count,
            result.total_questions(),
            result.percentage,
        );
    }

    fn on_sheet_error(&self, file_name: &str, error: &str) {
        eprintln!("  ERROR: {file_name}: {error}");
    }

    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    test_id: String,
    images: Vec<PathBuf>,
    student_id: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let ws = Workspace::open(config_path).await?;
    let test = ws.require_test(&test_id).await?;

    let mut sheets = Vec::with_capacity(images.len());
    for path in &images {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sheets.push(SheetImage::new(file_name, bytes));
    }

    let recognizer = create_recognizer(&ws.config.recognizer)?;
    eprintln!(
        "Scanning {} sheet(s) for '{}' with the {} recognizer...\n",
        sheets.len(),
        test.title,
        recognizer.name()
    );

    let engine = GradingEngine::new(
        recognizer,
        ws.repository.clone(),
        ws.config.engine_config(),
    );
    let outcome = engine
        .grade_batch(&test, sheets, student_id, &ConsoleReporter)
        .await?;

    print_outcome(&outcome, images.len(), test.passing_score);
    Ok(())
}

pub(crate) fn print_outcome(outcome: &BatchOutcome, total: usize, passing_score: u32) {
    use comfy_table::{Cell, Table};

    if !outcome.graded.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Student", "ID", "Score", "Percentage", "Status"]);
        for r in &outcome.graded {
            let status = if r.percentage >= passing_score {
                "Pass"
            } else {
                "Fail"
            };
            table.add_row(vec![
                Cell::new(&r.student_name),
                Cell::new(&r.student_id),
                Cell::new(format!("{}/{}", r.correct_count, r.total_questions())),
                Cell::new(format!("{}%", r.percentage)),
                Cell::new(status),
            ]);
        }
        println!("{table}");
    }

    println!("Graded {} of {} sheets", outcome.graded.len(), total);
    for f in &outcome.failures {
        println!("  Skipped {}: {}", f.file_name, f.error);
    }
}

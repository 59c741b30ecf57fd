//! The `snapgrade stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use snapgrade_core::report::GradingReport;
use snapgrade_core::statistics::hardest_questions;
use snapgrade_core::traits::TestRepository;

use super::Workspace;

pub async fn execute(test_id: String, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config_path).await?;
    let test = ws.require_test(&test_id).await?;
    let results = ws.repository.load_results(&test_id).await?;
    let report = GradingReport::build(&test, results);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "text" => print_text(&report),
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }

    Ok(())
}

fn print_text(report: &GradingReport) {
    println!(
        "Test: {} [{}] ({} questions, pass at {}%)",
        report.test.title, report.test.id, report.test.total_questions, report.test.passing_score
    );

    let Some(stats) = &report.class_statistics else {
        println!("No results yet for test '{}'.", report.test.id);
        return;
    };

    let mut class = Table::new();
    class.set_header(vec![
        "Students", "Average", "Highest", "Lowest", "Passed", "Pass Rate",
    ]);
    class.add_row(vec![
        Cell::new(stats.total_count),
        Cell::new(format!("{}%", stats.average)),
        Cell::new(format!("{}%", stats.highest)),
        Cell::new(format!("{}%", stats.lowest)),
        Cell::new(stats.passed_count),
        Cell::new(format!("{}%", stats.pass_rate_percent)),
    ]);
    println!("\n{class}");

    let mut questions = Table::new();
    questions.set_header(vec![
        "Question",
        "Answer",
        "Correct",
        "Incorrect",
        "Blank",
        "Correct %",
        "Most Common Wrong",
    ]);
    for q in &report.question_statistics {
        questions.add_row(vec![
            Cell::new(format!("Q{}", q.question_number)),
            Cell::new(q.expected_answer),
            Cell::new(q.correct_count),
            Cell::new(q.incorrect_count),
            Cell::new(q.unanswered_count),
            Cell::new(format!("{}%", q.correct_percentage)),
            Cell::new(q.most_common_wrong_answer.as_deref().unwrap_or("-")),
        ]);
    }
    println!("\n{questions}");

    let hardest = hardest_questions(&report.question_statistics, 3);
    if !hardest.is_empty() {
        let list = hardest
            .iter()
            .map(|q| format!("Q{} ({}%)", q.question_number, q.correct_percentage))
            .collect::<Vec<_>>()
            .join(", ");
        println!("\nHardest questions: {list}");
    }
}

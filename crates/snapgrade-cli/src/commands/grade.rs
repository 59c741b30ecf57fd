//! The `snapgrade grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use snapgrade_core::engine::GradingEngine;
use snapgrade_core::model::Submission;
use snapgrade_recognition::create_recognizer;

use super::scan::{print_outcome, ConsoleReporter};
use super::Workspace;

pub async fn execute(
    test_id: String,
    submissions_path: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let ws = Workspace::open(config_path).await?;
    let test = ws.require_test(&test_id).await?;

    let content = std::fs::read_to_string(&submissions_path)
        .with_context(|| format!("failed to read {}", submissions_path.display()))?;
    let submissions: Vec<Submission> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions: {}", submissions_path.display()))?;

    let engine = GradingEngine::new(
        create_recognizer(&ws.config.recognizer)?,
        ws.repository.clone(),
        ws.config.engine_config(),
    );
    let outcome = engine
        .grade_submissions(&test, &submissions, &ConsoleReporter)
        .await?;

    print_outcome(&outcome, submissions.len(), test.passing_score);
    Ok(())
}

//! The `snapgrade create` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use snapgrade_core::model::Test;
use snapgrade_core::parser;
use snapgrade_core::templates::find_template;
use snapgrade_core::traits::TestRepository;

use super::Workspace;

pub async fn execute(
    test_path: Option<PathBuf>,
    template: Option<String>,
    id: Option<String>,
    title: Option<String>,
    force: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let ws = Workspace::open(config_path).await?;

    let test = match (test_path, template) {
        (Some(path), _) => parser::parse_test(&path)?,
        (None, template) => {
            let (Some(id), Some(title)) = (id, title) else {
                anyhow::bail!("either --test <file> or --id and --title are required");
            };
            let template_id = template.unwrap_or_else(|| ws.config.default_template.clone());
            let template = find_template(&template_id)
                .with_context(|| format!("unknown template '{template_id}'"))?;
            Test::from_template(id, title, &template, ws.config.default_passing_score)?
        }
    };

    for w in parser::validate_test(&test) {
        let prefix = w.question.map(|q| format!("[Q{q}] ")).unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    if let Some(existing) = ws.repository.load_test(&test.id).await? {
        if !force {
            anyhow::bail!(
                "test '{}' already exists (use --force to replace it)",
                test.id
            );
        }
        // Stored results were graded against the existing key
        let key_changed = existing.answer_key != test.answer_key
            || existing.total_questions != test.total_questions;
        let graded = ws.repository.load_results(&test.id).await?.len();
        if key_changed && graded > 0 {
            anyhow::bail!(
                "test '{id}' has {graded} result(s) graded against its current answer key; \
                 run `snapgrade clear --test-id {id}` before changing the key",
                id = test.id
            );
        }
    }

    ws.repository.save_test(&test).await?;
    println!(
        "Created test '{}' ({}, {} questions, pass at {}%)",
        test.id, test.title, test.total_questions, test.passing_score
    );

    Ok(())
}

//! The `snapgrade templates` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use snapgrade_core::templates::builtin_templates;
use snapgrade_recognition::config::load_config_from;
use snapgrade_recognition::{create_recognizer, BackendRecognizer, RecognizerConfig};

pub async fn execute(remote: bool, config_path: Option<PathBuf>) -> Result<()> {
    let templates = if remote {
        let config = load_config_from(config_path.as_deref())?;
        if let RecognizerConfig::Backend {
            base_url,
            timeout_secs,
        } = &config.recognizer
        {
            BackendRecognizer::new(base_url, *timeout_secs)?
                .health()
                .await
                .with_context(|| format!("backend at {base_url} is not healthy"))?;
        }
        let recognizer = create_recognizer(&config.recognizer)?;
        recognizer
            .templates()
            .await
            .with_context(|| format!("failed to fetch templates from {}", recognizer.name()))?
    } else {
        builtin_templates()
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Questions", "Choices", "Description"]);
    for t in &templates {
        let choices = t
            .choices
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.name),
            Cell::new(t.questions),
            Cell::new(choices),
            Cell::new(&t.description),
        ]);
    }

    println!("{table}");
    Ok(())
}

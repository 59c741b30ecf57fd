//! snapgrade-report — Export graded results as CSV, JSON, or HTML.

pub mod csv;
pub mod html;

use std::path::Path;

use anyhow::Result;

/// Write a generated document, creating parent directories.
pub(crate) fn write_document(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Default export file name for a test title, e.g. `Unit 1-results.csv`.
pub fn default_file_name(title: &str, extension: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
        .collect();
    let stem = stem.trim();
    let stem = if stem.is_empty() { "snapgrade" } else { stem };
    format!("{stem}-results.{extension}")
}

//! The `snapgrade clear` command.

use std::path::PathBuf;

use anyhow::Result;

use snapgrade_core::traits::TestRepository;

use super::Workspace;

pub async fn execute(test_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config_path).await?;
    ws.require_test(&test_id).await?;

    let removed = ws.repository.clear_results(&test_id).await?;
    println!("Cleared {removed} result(s) for test '{test_id}'");
    Ok(())
}

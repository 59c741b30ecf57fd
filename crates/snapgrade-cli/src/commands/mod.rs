pub mod clear;
pub mod create;
pub mod export;
pub mod grade;
pub mod init;
pub mod scan;
pub mod stats;
pub mod templates;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use snapgrade_core::model::Test;
use snapgrade_core::traits::TestRepository;
use snapgrade_recognition::config::load_config_from;
use snapgrade_recognition::SnapgradeConfig;
use snapgrade_store::JsonDirRepository;

/// Loaded config plus the repository it points at.
pub(crate) struct Workspace {
    pub config: SnapgradeConfig,
    pub repository: Arc<JsonDirRepository>,
}

impl Workspace {
    pub async fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        tracing::debug!(?config, "loaded configuration");
        let repository = Arc::new(JsonDirRepository::open(config.data_dir.clone()).await?);
        Ok(Self { config, repository })
    }

    /// Load a test or fail with a hint.
    pub async fn require_test(&self, test_id: &str) -> Result<Test> {
        self.repository.load_test(test_id).await?.ok_or_else(|| {
            anyhow::anyhow!(
                "test '{test_id}' not found in {}. Register it with `snapgrade create`.",
                self.repository.root().display()
            )
        })
    }
}

//! In-process repository.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use snapgrade_core::model::Test;
use snapgrade_core::results::ScanResult;
use snapgrade_core::traits::TestRepository;

#[derive(Default)]
struct State {
    tests: BTreeMap<String, Test>,
    results: HashMap<String, Vec<ScanResult>>,
}

/// Repository that keeps tests and results in memory.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-populated with tests.
    pub fn with_tests(tests: impl IntoIterator<Item = Test>) -> Self {
        let state = State {
            tests: tests.into_iter().map(|t| (t.id.clone(), t)).collect(),
            results: HashMap::new(),
        };
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl TestRepository for MemoryRepository {
    async fn load_test(&self, id: &str) -> Result<Option<Test>> {
        Ok(self.state.read().await.tests.get(id).cloned())
    }

    async fn save_test(&self, test: &Test) -> Result<()> {
        test.check()?;
        self.state
            .write()
            .await
            .tests
            .insert(test.id.clone(), test.clone());
        Ok(())
    }

    async fn list_tests(&self) -> Result<Vec<Test>> {
        Ok(self.state.read().await.tests.values().cloned().collect())
    }

    async fn load_results(&self, test_id: &str) -> Result<Vec<ScanResult>> {
        Ok(self
            .state
            .read()
            .await
            .results
            .get(test_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_result(&self, test_id: &str, result: &ScanResult) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.tests.contains_key(test_id) {
            anyhow::bail!("unknown test '{test_id}'");
        }
        state
            .results
            .entry(test_id.to_string())
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn clear_results(&self, test_id: &str) -> Result<usize> {
        Ok(self
            .state
            .write()
            .await
            .results
            .remove(test_id)
            .map_or(0, |r| r.len()))
    }
}

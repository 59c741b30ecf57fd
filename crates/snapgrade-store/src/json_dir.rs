//! JSON-file repository.
//!
//! Layout under the root directory:
//!
//! ```text
//! tests/<id>.json      one Test per file
//! results/<id>.json    array of ScanResult, in grading order
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use snapgrade_core::model::Test;
use snapgrade_core::results::ScanResult;
use snapgrade_core::traits::TestRepository;

use crate::check_id;

/// Repository backed by a directory of JSON files.
pub struct JsonDirRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDirRepository {
    /// Open a repository, creating its directories if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.join("tests"), root.join("results")] {
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        debug!(root = %root.display(), "opened JSON repository");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn test_path(&self, id: &str) -> PathBuf {
        self.root.join("tests").join(format!("{id}.json"))
    }

    fn results_path(&self, id: &str) -> PathBuf {
        self.root.join("results").join(format!("{id}.json"))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let value = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Write through a sibling temp file and rename it into place.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}

#[async_trait]
impl TestRepository for JsonDirRepository {
    async fn load_test(&self, id: &str) -> Result<Option<Test>> {
        check_id(id)?;
        let path = self.test_path(id);
        let test: Option<Test> = read_json(&path).await?;
        if let Some(test) = &test {
            test.check()
                .with_context(|| format!("invalid test definition in {}", path.display()))?;
        }
        Ok(test)
    }

    async fn save_test(&self, test: &Test) -> Result<()> {
        check_id(&test.id)?;
        test.check()
            .with_context(|| format!("refusing to save invalid test '{}'", test.id))?;
        let _guard = self.write_lock.lock().await;
        write_json(&self.test_path(&test.id), test).await?;
        info!(test_id = %test.id, "saved test");
        Ok(())
    }

    async fn list_tests(&self) -> Result<Vec<Test>> {
        let dir = self.root.join("tests");
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read {}", dir.display()))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tests = Vec::with_capacity(paths.len());
        for path in paths {
            match read_json::<Test>(&path).await {
                Ok(Some(test)) => match test.check() {
                    Ok(()) => tests.push(test),
                    Err(e) => warn!("skipping invalid test {}: {e}", path.display()),
                },
                Ok(None) => {}
                Err(e) => warn!("skipping {}: {e:#}", path.display()),
            }
        }
        Ok(tests)
    }

    async fn load_results(&self, test_id: &str) -> Result<Vec<ScanResult>> {
        check_id(test_id)?;
        Ok(read_json(&self.results_path(test_id))
            .await?
            .unwrap_or_default())
    }

    async fn append_result(&self, test_id: &str, result: &ScanResult) -> Result<()> {
        check_id(test_id)?;
        let _guard = self.write_lock.lock().await;

        if !tokio::fs::try_exists(self.test_path(test_id)).await? {
            anyhow::bail!("unknown test '{test_id}'");
        }

        let path = self.results_path(test_id);
        let mut results: Vec<ScanResult> = read_json(&path).await?.unwrap_or_default();
        results.push(result.clone());
        write_json(&path, &results).await?;
        debug!(test_id, count = results.len(), "appended result");
        Ok(())
    }

    async fn clear_results(&self, test_id: &str) -> Result<usize> {
        check_id(test_id)?;
        let _guard = self.write_lock.lock().await;

        let path = self.results_path(test_id);
        let existing: Vec<ScanResult> = read_json(&path).await?.unwrap_or_default();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to remove {}", path.display()))
            }
        }
        info!(test_id, removed = existing.len(), "cleared results");
        Ok(existing.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use snapgrade_core::model::{AnswerKey, Submission};

    fn quiz(id: &str) -> Test {
        let key = AnswerKey::parse(&["A", "B", "C"]).unwrap();
        Test::new(id, "Quiz", key, 70).unwrap()
    }

    fn result_for(test: &Test, name: &str, answers: [&str; 3]) -> ScanResult {
        let submission = Submission {
            student_name: name.into(),
            student_id: format!("id-{name}"),
            responses: answers.iter().map(|a| Some(a.to_string())).collect(),
        };
        ScanResult::grade(&test.answer_key, &submission, test.passing_score, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();

        repo.save_test(&quiz("b-quiz")).await.unwrap();
        repo.save_test(&quiz("a-quiz")).await.unwrap();

        let loaded = repo.load_test("a-quiz").await.unwrap().unwrap();
        assert_eq!(loaded.total_questions, 3);
        assert!(repo.load_test("missing").await.unwrap().is_none());

        let ids: Vec<_> = repo
            .list_tests()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a-quiz", "b-quiz"]);
    }

    #[tokio::test]
    async fn results_append_in_order_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();
        let test = quiz("q1");
        repo.save_test(&test).await.unwrap();

        assert!(repo.load_results("q1").await.unwrap().is_empty());

        let alice = result_for(&test, "Alice", ["A", "B", "C"]);
        let bob = result_for(&test, "Bob", ["A", "A", "A"]);
        repo.append_result("q1", &alice).await.unwrap();
        repo.append_result("q1", &bob).await.unwrap();

        let results = repo.load_results("q1").await.unwrap();
        assert_eq!(results, vec![alice, bob]);

        assert_eq!(repo.clear_results("q1").await.unwrap(), 2);
        assert!(repo.load_results("q1").await.unwrap().is_empty());
        assert_eq!(repo.clear_results("q1").await.unwrap(), 0);
        assert!(repo.load_test("q1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn hand_edited_invalid_test_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();
        repo.save_test(&quiz("good")).await.unwrap();
        std::fs::write(
            dir.path().join("tests").join("x.json"),
            r#"{"id": "x", "title": "X", "totalQuestions": 5, "answerKey": ["A", "B"], "passingScore": 70}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("tests").join("y.json"),
            r#"{"id": "y", "title": "Y", "total_questions": 2, "answer_key": ["A", "B"], "passing_score": 150}"#,
        )
        .unwrap();

        let err = repo.load_test("x").await.unwrap_err();
        assert!(format!("{err:#}").contains("declares 5 questions"));
        let err = repo.load_test("y").await.unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));

        let ids: Vec<_> = repo
            .list_tests()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[tokio::test]
    async fn append_to_unknown_test_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();
        let test = quiz("ghost");
        let result = result_for(&test, "Alice", ["A", "B", "C"]);

        let err = repo.append_result("ghost", &result).await.unwrap_err();
        assert!(err.to_string().contains("unknown test"));
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonDirRepository::open(dir.path()).await.unwrap());
        let test = quiz("busy");
        repo.save_test(&test).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let repo = Arc::clone(&repo);
            let result = result_for(&test, &format!("s{i}"), ["A", "B", "C"]);
            handles.push(tokio::spawn(async move {
                repo.append_result("busy", &result).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.load_results("busy").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn reopen_sees_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let test = quiz("persisted");
        {
            let repo = JsonDirRepository::open(dir.path()).await.unwrap();
            repo.save_test(&test).await.unwrap();
            repo.append_result("persisted", &result_for(&test, "A", ["A", "B", "C"]))
                .await
                .unwrap();
        }
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();
        assert_eq!(repo.load_results("persisted").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).await.unwrap();
        assert!(repo.load_results("../outside").await.is_err());
    }
}

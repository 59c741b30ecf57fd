//! Grading report: a test's results plus the analytics derived from them,
//! with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Test, TestSummary};
use crate::results::ScanResult;
use crate::statistics::{class_statistics, question_statistics, ClassStatistics, QuestionStatistic};

/// A complete grading report for one test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the test.
    pub test: TestSummary,
    /// Individual results, in grading order.
    pub results: Vec<ScanResult>,
    /// `None` until at least one sheet has been graded.
    pub class_statistics: Option<ClassStatistics>,
    /// One entry per question.
    pub question_statistics: Vec<QuestionStatistic>,
}

impl GradingReport {
    /// Build a report from a snapshot of a test's results.
    pub fn build(test: &Test, results: Vec<ScanResult>) -> Self {
        let class_statistics = class_statistics(&results, test.passing_score);
        let question_statistics = question_statistics(&test.answer_key, &results);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test: test.summary(),
            results,
            class_statistics,
            question_statistics,
        }
    }

    /// Whether a result passes under this report's test threshold.
    pub fn passed(&self, result: &ScanResult) -> bool {
        result.percentage >= self.test.passing_score
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, Submission};

    fn sample() -> (Test, Vec<ScanResult>) {
        let key = AnswerKey::parse(&["A", "B", "C", "D", "A"]).unwrap();
        let test = Test::new("t1", "Unit 1", key, 70).unwrap();
        let grade = |name: &str, responses: &[Option<&str>]| {
            let sub = Submission {
                student_name: name.into(),
                student_id: String::new(),
                responses: responses.iter().map(|r| r.map(str::to_string)).collect(),
            };
            ScanResult::grade(&test.answer_key, &sub, test.passing_score, Utc::now()).unwrap()
        };
        let results = vec![
            grade("Alice", &[Some("A"), Some("B"), Some("C"), Some("D"), Some("A")]),
            grade("Bob", &[Some("A"), Some("B"), Some("X"), None, Some("A")]),
        ];
        (test, results)
    }

    #[test]
    fn build_derives_statistics() {
        let (test, results) = sample();
        let report = GradingReport::build(&test, results);
        let stats = report.class_statistics.unwrap();
        assert_eq!(stats.average, 80);
        assert_eq!(report.question_statistics.len(), 5);
        assert!(report.passed(&report.results[0]));
        assert!(!report.passed(&report.results[1]));
    }

    #[test]
    fn empty_report_has_no_class_statistics() {
        let (test, _) = sample();
        let report = GradingReport::build(&test, vec![]);
        assert!(report.class_statistics.is_none());
        assert_eq!(report.question_statistics.len(), 5);
    }

    #[test]
    fn json_roundtrip() {
        let (test, results) = sample();
        let report = GradingReport::build(&test, results);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GradingReport::load_json(&path).unwrap();

        assert_eq!(loaded.test.id, "t1");
        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.class_statistics, report.class_statistics);
    }
}

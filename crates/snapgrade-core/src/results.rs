//! Per-submission grading: the scorer and the `ScanResult` record it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GradeError;
use crate::model::{AnswerKey, Submission};

/// Integer division of `numerator / denominator`, rounding halves up.
///
/// Matches `Math.round` on non-negative values, so 12.5 rounds to 13.
/// A zero denominator yields 0.
pub fn round_half_up(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((2 * numerator + denominator) / (2 * denominator)) as u32
}

/// `round(100 * part / whole)` with half-up rounding.
pub fn percent(part: usize, whole: usize) -> u32 {
    round_half_up(100 * part as u64, whole as u64)
}

/// The outcome of comparing one response sequence against an answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct_count: usize,
    pub incorrect_count: usize,
    /// Whole percent in `0..=100`.
    pub percentage: u32,
    pub passed: bool,
}

impl Score {
    /// Grade `responses` against `key`.
    ///
    /// A response counts as correct only when it is exactly the expected
    /// upper-case letter. Blanks and unrecognised symbols are incorrect, never
    /// rejected. The only failure is a length mismatch.
    pub fn compute(
        key: &AnswerKey,
        responses: &[Option<String>],
        passing_threshold: u32,
    ) -> Result<Score, GradeError> {
        if responses.len() != key.len() {
            return Err(GradeError::ShapeMismatch {
                expected: key.len(),
                actual: responses.len(),
            });
        }

        let correct_count = key
            .iter()
            .zip(responses)
            .filter(|(expected, response)| {
                response
                    .as_deref()
                    .is_some_and(|answer| expected.matches(answer))
            })
            .count();
        let incorrect_count = key.len() - correct_count;
        let percentage = percent(correct_count, key.len());

        Ok(Score {
            correct_count,
            incorrect_count,
            percentage,
            passed: percentage >= passing_threshold,
        })
    }
}

/// Free-function form of [`Score::compute`].
pub fn score(
    key: &AnswerKey,
    responses: &[Option<String>],
    passing_threshold: u32,
) -> Result<Score, GradeError> {
    Score::compute(key, responses, passing_threshold)
}

/// The graded outcome of one student's sheet. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub id: Uuid,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_id: String,
    /// Recognised responses; `None` is a blank bubble.
    pub responses: Vec<Option<String>>,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub percentage: u32,
    pub passed: bool,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// Grade a submission and stamp it with `scanned_at`.
    pub fn grade(
        key: &AnswerKey,
        submission: &Submission,
        passing_threshold: u32,
        scanned_at: DateTime<Utc>,
    ) -> Result<ScanResult, GradeError> {
        let score = Score::compute(key, &submission.responses, passing_threshold)?;
        Ok(ScanResult {
            id: Uuid::new_v4(),
            student_name: submission.student_name.clone(),
            student_id: submission.student_id.clone(),
            responses: submission.responses.clone(),
            correct_count: score.correct_count,
            incorrect_count: score.incorrect_count,
            percentage: score.percentage,
            passed: score.passed,
            scanned_at,
        })
    }

    /// Raw score: the number of correct answers.
    pub fn score(&self) -> usize {
        self.correct_count
    }

    pub fn total_questions(&self) -> usize {
        self.correct_count + self.incorrect_count
    }

    /// Response at a 0-based question index; out-of-range reads as blank.
    pub fn response(&self, index: usize) -> Option<&str> {
        self.responses.get(index).and_then(|r| r.as_deref())
    }
}

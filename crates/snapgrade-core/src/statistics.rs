//! Class-level and per-question analytics over a test's graded results.
//!
//! Everything here is recomputed from the result snapshot it is handed; there
//! is no cached state, so repeated calls on the same input are identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerKey, Choice};
use crate::results::{percent, round_half_up, ScanResult};

/// Aggregate metrics across every result for one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStatistics {
    /// Mean percentage, rounded half-up.
    pub average: u32,
    pub highest: u32,
    pub lowest: u32,
    pub passed_count: usize,
    pub total_count: usize,
    pub pass_rate_percent: u32,
}

/// Correctness metrics for one question across every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStatistic {
    /// 1-indexed question number.
    pub question_number: usize,
    pub expected_answer: Choice,
    pub correct_count: usize,
    /// Includes blanks.
    pub incorrect_count: usize,
    /// Blank or undetected responses.
    pub unanswered_count: usize,
    /// 0 when there are no results.
    pub correct_percentage: u32,
    /// Most frequent non-blank wrong answer; ties go to the smallest answer.
    pub most_common_wrong_answer: Option<String>,
}

/// Compute class statistics, or `None` when nothing has been graded yet.
///
/// Pass/fail is re-derived from each result's percentage against
/// `passing_threshold`, so a changed threshold applies retroactively.
pub fn class_statistics(results: &[ScanResult], passing_threshold: u32) -> Option<ClassStatistics> {
    let highest = results.iter().map(|r| r.percentage).max()?;
    let lowest = results.iter().map(|r| r.percentage).min()?;

    let total_count = results.len();
    let sum: u64 = results.iter().map(|r| r.percentage as u64).sum();
    let passed_count = results
        .iter()
        .filter(|r| r.percentage >= passing_threshold)
        .count();

    Some(ClassStatistics {
        average: round_half_up(sum, total_count as u64),
        highest,
        lowest,
        passed_count,
        total_count,
        pass_rate_percent: percent(passed_count, total_count),
    })
}

/// Per-question statistics, one entry per question in key order.
pub fn question_statistics(key: &AnswerKey, results: &[ScanResult]) -> Vec<QuestionStatistic> {
    key.iter()
        .enumerate()
        .map(|(index, expected)| question_statistic(index, expected, results))
        .collect()
}

fn question_statistic(index: usize, expected: Choice, results: &[ScanResult]) -> QuestionStatistic {
    let mut correct_count = 0usize;
    let mut unanswered_count = 0usize;
    let mut wrong: BTreeMap<&str, usize> = BTreeMap::new();

    for result in results {
        match result.response(index) {
            Some(answer) if expected.matches(answer) => correct_count += 1,
            Some(answer) => *wrong.entry(answer).or_default() += 1,
            None => unanswered_count += 1,
        }
    }

    // BTreeMap iterates in ascending order; strict `>` keeps the first maximum.
    let mut most_common: Option<(&str, usize)> = None;
    for (&answer, &count) in &wrong {
        if most_common.map_or(true, |(_, best)| count > best) {
            most_common = Some((answer, count));
        }
    }

    QuestionStatistic {
        question_number: index + 1,
        expected_answer: expected,
        correct_count,
        incorrect_count: results.len() - correct_count,
        unanswered_count,
        correct_percentage: percent(correct_count, results.len()),
        most_common_wrong_answer: most_common.map(|(answer, _)| answer.to_string()),
    }
}

/// Questions sorted from hardest to easiest (lowest correct percentage first).
///
/// Ties keep question order.
pub fn hardest_questions(stats: &[QuestionStatistic], limit: usize) -> Vec<&QuestionStatistic> {
    let mut sorted: Vec<&QuestionStatistic> = stats.iter().collect();
    sorted.sort_by_key(|s| s.correct_percentage);
    sorted.truncate(limit);
    sorted
}

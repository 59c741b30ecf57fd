//! Core data model types for snapgrade.
//!
//! Tests own an answer key and a set of graded results; submissions are the
//! raw response sequences that come back from recognition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::templates::BubbleSheetTemplate;

/// Default passing threshold, in percent.
pub const DEFAULT_PASSING_SCORE: u32 = 70;

/// A single answer letter on a bubble sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    /// Every choice, in sheet order.
    pub const ALL: [Choice; 5] = [Choice::A, Choice::B, Choice::C, Choice::D, Choice::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
            Choice::E => "E",
        }
    }

    /// Whether a recognised response is exactly this choice.
    ///
    /// Matching is case-sensitive: recognisers emit upper-case letters, and
    /// anything else is simply not this answer.
    pub fn matches(&self, response: &str) -> bool {
        response == self.as_str()
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = GradeError;

    /// Lenient parse used for hand-written test definitions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            "E" => Ok(Choice::E),
            _ => Err(GradeError::InvalidChoice(s.to_string())),
        }
    }
}

/// The ordered list of correct choices for a test, one per question.
///
/// Never empty. Question numbers are 1-indexed positions in the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Choice>", into = "Vec<Choice>")]
pub struct AnswerKey {
    questions: Vec<Choice>,
}

impl AnswerKey {
    pub fn new(questions: Vec<Choice>) -> Result<Self, GradeError> {
        if questions.is_empty() {
            return Err(GradeError::EmptyAnswerKey);
        }
        Ok(Self { questions })
    }

    /// Parse a key from individual letters, e.g. `["A", "b", "C"]`.
    pub fn parse<S: AsRef<str>>(letters: &[S]) -> Result<Self, GradeError> {
        let questions = letters
            .iter()
            .map(|l| l.as_ref().parse())
            .collect::<Result<Vec<Choice>, _>>()?;
        Self::new(questions)
    }

    /// Parse a compact key such as `"ABCD A"`; whitespace is ignored.
    pub fn parse_compact(compact: &str) -> Result<Self, GradeError> {
        let questions = compact
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string().parse())
            .collect::<Result<Vec<Choice>, _>>()?;
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Choice> {
        self.questions.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Choice> + '_ {
        self.questions.iter().copied()
    }

    /// The key as plain strings, the shape the recognition backend expects.
    pub fn to_letters(&self) -> Vec<String> {
        self.questions.iter().map(|c| c.to_string()).collect()
    }
}

impl TryFrom<Vec<Choice>> for AnswerKey {
    type Error = GradeError;

    fn try_from(questions: Vec<Choice>) -> Result<Self, Self::Error> {
        Self::new(questions)
    }
}

impl From<AnswerKey> for Vec<Choice> {
    fn from(key: AnswerKey) -> Self {
        key.questions
    }
}

/// A test: the owner of an answer key and of a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    /// Unique identifier, also used as the storage key for results.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Declared question count; always equal to `answer_key.len()`.
    #[serde(alias = "totalQuestions")]
    pub total_questions: usize,
    #[serde(alias = "answerKey")]
    pub answer_key: AnswerKey,
    /// Minimum percentage counted as a pass.
    #[serde(default = "default_passing_score", alias = "passingScore")]
    pub passing_score: u32,
    /// Bubble-sheet template the test was printed on, if any.
    #[serde(default, alias = "templateId")]
    pub template_id: Option<String>,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}

impl Test {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        answer_key: AnswerKey,
        passing_score: u32,
    ) -> Result<Self, GradeError> {
        let test = Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            total_questions: answer_key.len(),
            answer_key,
            passing_score,
            template_id: None,
            created_at: Utc::now(),
        };
        test.check()?;
        Ok(test)
    }

    /// Start a test from a printed template with every answer pre-set to `A`.
    pub fn from_template(
        id: impl Into<String>,
        title: impl Into<String>,
        template: &BubbleSheetTemplate,
        passing_score: u32,
    ) -> Result<Self, GradeError> {
        let key = AnswerKey::new(vec![Choice::A; template.questions])?;
        let mut test = Self::new(id, title, key, passing_score)?;
        test.template_id = Some(template.id.clone());
        Ok(test)
    }

    /// Check the structural invariants of a test.
    pub fn check(&self) -> Result<(), GradeError> {
        if self.answer_key.len() != self.total_questions {
            return Err(GradeError::KeyLengthMismatch {
                declared: self.total_questions,
                actual: self.answer_key.len(),
            });
        }
        if self.passing_score > 100 {
            return Err(GradeError::InvalidPassingScore(self.passing_score));
        }
        Ok(())
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            total_questions: self.total_questions,
            passing_score: self.passing_score,
        }
    }
}

/// Summary of a test (without the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub title: String,
    pub total_questions: usize,
    pub passing_score: u32,
}

/// One student's recognised responses, ready to be graded.
///
/// `None` marks a blank or undetected bubble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default, alias = "studentName")]
    pub student_name: String,
    #[serde(default, alias = "studentId")]
    pub student_id: String,
    #[serde(alias = "answers")]
    pub responses: Vec<Option<String>>,
}

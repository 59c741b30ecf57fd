//! TOML test definition parser.
//!
//! Loads tests from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;

use crate::model::{AnswerKey, Test, DEFAULT_PASSING_SCORE};
use crate::templates::find_template;

/// Intermediate TOML structure for parsing test files.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_passing_score")]
    passing_score: u32,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    total_questions: Option<usize>,
    answer_key: TomlAnswerKey,
}

/// `answer_key = ["A", "B"]` or `answer_key = "AB"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlAnswerKey {
    Letters(Vec<String>),
    Compact(String),
}

fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}

/// Parse a single TOML file into a `Test`.
pub fn parse_test(path: &Path) -> Result<Test> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    parse_test_str(&content, path)
}

/// Parse a TOML string into a `Test` (useful for testing).
pub fn parse_test_str(content: &str, source_path: &Path) -> Result<Test> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    let header = parsed.test;

    let answer_key = match &header.answer_key {
        TomlAnswerKey::Letters(letters) => AnswerKey::parse(letters.as_slice()),
        TomlAnswerKey::Compact(compact) => AnswerKey::parse_compact(compact),
    }
    .with_context(|| format!("invalid answer key in {}", source_path.display()))?;

    let template = match &header.template {
        Some(id) => Some(
            find_template(id)
                .with_context(|| format!("unknown template '{id}' in {}", source_path.display()))?,
        ),
        None => None,
    };

    let total_questions = header
        .total_questions
        .or(template.as_ref().map(|t| t.questions))
        .unwrap_or(answer_key.len());

    let test = Test {
        id: header.id,
        title: header.title,
        description: header.description,
        total_questions,
        answer_key,
        passing_score: header.passing_score,
        template_id: header.template,
        created_at: Utc::now(),
    };
    test.check()
        .with_context(|| format!("invalid test definition: {}", source_path.display()))?;

    Ok(test)
}

/// Recursively load all `.toml` test files from a directory.
pub fn load_test_directory(dir: &Path) -> Result<Vec<Test>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(tests)
}

/// Load a single file or every test under a directory.
pub fn load_tests(path: &Path) -> Result<Vec<Test>> {
    if path.is_dir() {
        load_test_directory(path)
    } else {
        Ok(vec![parse_test(path)?])
    }
}

/// A warning from test validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question number (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a test for common authoring mistakes.
pub fn validate_test(test: &Test) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if test.title.trim().is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "title is empty".into(),
        });
    }

    if test.passing_score == 0 {
        warnings.push(ValidationWarning {
            question: None,
            message: "passing score is 0; every student will pass".into(),
        });
    }

    // Answers the printed sheet has no bubble for can never be marked correct
    if let Some(template) = test.template_id.as_deref().and_then(find_template) {
        for (i, choice) in test.answer_key.iter().enumerate() {
            if !template.offers(choice) {
                warnings.push(ValidationWarning {
                    question: Some(i + 1),
                    message: format!(
                        "answer {choice} is not offered by template '{}'",
                        template.id
                    ),
                });
            }
        }
    }

    let first = test.answer_key.get(0);
    if test.answer_key.len() > 1 && test.answer_key.iter().all(|c| Some(c) == first) {
        warnings.push(ValidationWarning {
            question: None,
            message: format!(
                "every answer in the key is {}; was the key filled in?",
                first.map(|c| c.to_string()).unwrap_or_default()
            ),
        });
    }

    warnings
}

/// Check a set of tests for duplicate ids.
pub fn duplicate_ids(tests: &[Test]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut dupes = Vec::new();
    for test in tests {
        if !seen.insert(test.id.as_str()) && !dupes.contains(&test.id) {
            dupes.push(test.id.clone());
        }
    }
    dupes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Choice;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[test]
id = "bio-midterm"
title = "Biology Midterm"
description = "Chapters 1-4"
passing_score = 65
template = "simple_5"
answer_key = ["A", "B", "C", "D", "A"]
"#;

    #[test]
    fn parse_valid_toml() {
        let test = parse_test_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(test.id, "bio-midterm");
        assert_eq!(test.title, "Biology Midterm");
        assert_eq!(test.total_questions, 5);
        assert_eq!(test.passing_score, 65);
        assert_eq!(test.template_id.as_deref(), Some("simple_5"));
        assert_eq!(test.answer_key.get(3), Some(Choice::D));
        assert!(validate_test(&test).is_empty());
    }

    #[test]
    fn parse_compact_key_and_defaults() {
        let toml = r#"
[test]
id = "quiz"
title = "Quiz"
answer_key = "abcd e"
"#;
        let test = parse_test_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(test.passing_score, 70);
        assert_eq!(test.total_questions, 5);
        assert_eq!(test.answer_key.get(4), Some(Choice::E));
        assert!(test.template_id.is_none());
    }

    #[test]
    fn template_question_count_must_match_key() {
        let toml = r#"
[test]
id = "short"
title = "Short"
template = "standard_25"
answer_key = "ABCDA"
"#;
        let err = parse_test_str(toml, &PathBuf::from("short.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("declares 25 questions"));
    }

    #[test]
    fn invalid_letter_is_an_error() {
        let toml = r#"
[test]
id = "bad"
title = "Bad"
answer_key = ["A", "F"]
"#;
        let err = parse_test_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid answer choice"));
    }

    #[test]
    fn passing_score_out_of_range() {
        let toml = r#"
[test]
id = "bad"
title = "Bad"
passing_score = 150
answer_key = "AB"
"#;
        assert!(parse_test_str(toml, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn unknown_template() {
        let toml = r#"
[test]
id = "bad"
title = "Bad"
template = "standard_30"
answer_key = "AB"
"#;
        let err = parse_test_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown template"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_test_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_choice_outside_template() {
        let toml = r#"
[test]
id = "e"
title = "Uses E"
template = "simple_5"
answer_key = "ABCDE"
"#;
        let test = parse_test_str(toml, &PathBuf::from("e.toml")).unwrap();
        let warnings = validate_test(&test);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].question, Some(5));
        assert!(warnings[0].message.contains("not offered"));
    }

    #[test]
    fn validate_unfilled_key() {
        let toml = r#"
[test]
id = "blank"
title = ""
answer_key = "AAAA"
"#;
        let test = parse_test_str(toml, &PathBuf::from("blank.toml")).unwrap();
        let warnings = validate_test(&test);
        assert!(warnings.iter().any(|w| w.message.contains("title is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("filled in")));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "[test]\nid = 1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tests = load_test_directory(dir.path()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, "bio-midterm");
    }

    #[test]
    fn detects_duplicate_ids() {
        let a = parse_test_str(VALID_TOML, &PathBuf::from("a.toml")).unwrap();
        let b = a.clone();
        assert_eq!(duplicate_ids(&[a, b]), vec!["bio-midterm".to_string()]);
    }
}

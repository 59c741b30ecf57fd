//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn snapgrade(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("snapgrade").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("SNAPGRADE_BACKEND_URL")
        .env_remove("RUST_LOG");
    cmd
}

const QUIZ: &str = r#"[test]
id = "unit-1"
title = "Unit 1"
passing_score = 70
answer_key = ["A", "B", "C", "D", "A"]
"#;

const SUBMISSIONS: &str = r#"[
  {"student_name": "Alice", "student_id": "ST1001", "responses": ["A", "B", "C", "D", "A"]},
  {"student_name": "Bob", "student_id": "ST1002", "responses": ["A", "B", "X", null, "A"]}
]"#;

/// A workspace with a seeded demo config and the `unit-1` test registered.
fn workspace_with_quiz() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("snapgrade.toml"),
        "retry_delay_ms = 1\n\n[recognizer]\ntype = \"demo\"\nseed = 7\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("quiz.toml"), QUIZ).unwrap();
    std::fs::write(dir.path().join("submissions.json"), SUBMISSIONS).unwrap();

    snapgrade(dir.path())
        .args(["create", "--test", "quiz.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created test 'unit-1'"));
    dir
}

fn grade_submissions(dir: &Path) {
    snapgrade(dir)
        .args(["grade", "--test-id", "unit-1", "--submissions", "submissions.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graded 2 of 2 sheets"));
}

#[test]
fn validate_single_definition() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path())
        .arg("validate")
        .arg("--test")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-definitions/biology-unit1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Biology Unit 1: Cells"))
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path())
        .arg("validate")
        .arg("--test")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-definitions"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Algebra Midterm"))
        .stdout(predicate::str::contains("25 questions"))
        .stdout(predicate::str::contains("World History Final"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("e.toml"),
        "[test]\nid = \"e\"\ntitle = \"Uses E\"\ntemplate = \"simple_5\"\nanswer_key = \"ABCDE\"\n",
    )
    .unwrap();

    snapgrade(dir.path())
        .args(["validate", "--test", "e.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Q5] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path())
        .args(["validate", "--test", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    snapgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created snapgrade.toml"))
        .stdout(predicate::str::contains("Created tests/example.toml"));

    assert!(dir.path().join("snapgrade.toml").exists());

    snapgrade(dir.path())
        .args(["validate", "--test", "tests/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn init_skips_existing_files() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path()).arg("init").assert().success();

    snapgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));
}

#[test]
fn templates_lists_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path())
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("simple_5"))
        .stdout(predicate::str::contains("extended_100"))
        .stdout(predicate::str::contains("A,B,C,D,E"));
}

#[test]
fn remote_templates_check_backend_health() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("snapgrade.toml"),
        "[recognizer]\ntype = \"backend\"\nbase_url = \"http://127.0.0.1:1\"\ntimeout_secs = 2\n",
    )
    .unwrap();

    snapgrade(dir.path())
        .args(["templates", "--remote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend at http://127.0.0.1:1 is not healthy"));
}

#[test]
fn create_rejects_duplicates_without_force() {
    let dir = workspace_with_quiz();

    snapgrade(dir.path())
        .args(["create", "--test", "quiz.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    snapgrade(dir.path())
        .args(["create", "--test", "quiz.toml", "--force"])
        .assert()
        .success();
}

#[test]
fn create_force_keeps_key_while_results_exist() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());
    std::fs::write(
        dir.path().join("rekeyed.toml"),
        "[test]\nid = \"unit-1\"\ntitle = \"Unit 1\"\nanswer_key = [\"E\", \"E\", \"E\"]\n",
    )
    .unwrap();

    snapgrade(dir.path())
        .args(["create", "--test", "rekeyed.toml", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("snapgrade clear --test-id unit-1"));

    let output = snapgrade(dir.path())
        .args(["stats", "--test-id", "unit-1", "--format", "json"])
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["test"]["total_questions"], 5);
    assert_eq!(report["question_statistics"][0]["expected_answer"], "A");

    // Same key with a new title is still allowed
    std::fs::write(
        dir.path().join("retitled.toml"),
        QUIZ.replace("title = \"Unit 1\"", "title = \"Unit 1 (revised)\""),
    )
    .unwrap();
    snapgrade(dir.path())
        .args(["create", "--test", "retitled.toml", "--force"])
        .assert()
        .success();

    snapgrade(dir.path())
        .args(["clear", "--test-id", "unit-1"])
        .assert()
        .success();
    snapgrade(dir.path())
        .args(["create", "--test", "rekeyed.toml", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 questions"));
}

#[test]
fn create_from_template_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("snapgrade.toml"), "default_passing_score = 60\n").unwrap();

    snapgrade(dir.path())
        .args(["create", "--id", "blank", "--title", "Blank Sheet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("25 questions, pass at 60%"));
}

#[test]
fn grade_then_stats() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());

    snapgrade(dir.path())
        .args(["stats", "--test-id", "unit-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80%"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("60%"))
        .stdout(predicate::str::contains("50%"))
        .stdout(predicate::str::contains("Hardest questions: Q3 (50%)"));
}

#[test]
fn stats_json_output() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());

    let output = snapgrade(dir.path())
        .args(["stats", "--test-id", "unit-1", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["class_statistics"]["average"], 80);
    assert_eq!(report["class_statistics"]["passed_count"], 1);
    assert_eq!(report["question_statistics"][2]["most_common_wrong_answer"], "X");
    assert_eq!(report["question_statistics"][3]["unanswered_count"], 1);
}

#[test]
fn export_csv() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());

    snapgrade(dir.path())
        .args(["export", "--test-id", "unit-1", "--format", "csv", "--output", "out.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 result(s) as CSV"));

    let csv = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
    let lines: Vec<&str> = csv.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with(r#""Student Name","Student ID","Score""#));
    assert!(lines[1].starts_with(r#""Alice","ST1001","5","100","5","0","Pass","#));
    assert!(lines[2].starts_with(r#""Bob","ST1002","3","60","3","2","Fail","#));
}

#[test]
fn export_html_and_json_default_names() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());

    snapgrade(dir.path())
        .args(["export", "--test-id", "unit-1", "--format", "html"])
        .assert()
        .success();
    let html = std::fs::read_to_string(dir.path().join("Unit 1-results.html")).unwrap();
    assert!(html.contains("<svg"));

    snapgrade(dir.path())
        .args(["export", "--test-id", "unit-1", "--format", "json"])
        .assert()
        .success();
    assert!(dir.path().join("Unit 1-results.json").exists());
}

#[test]
fn export_without_results_fails() {
    let dir = workspace_with_quiz();
    snapgrade(dir.path())
        .args(["export", "--test-id", "unit-1", "--format", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no results to export"));
}

#[test]
fn scan_with_demo_recognizer() {
    let dir = workspace_with_quiz();
    std::fs::write(dir.path().join("sheet-1.jpg"), b"not really a jpeg").unwrap();
    std::fs::write(dir.path().join("sheet-2.jpg"), b"not really a jpeg").unwrap();

    snapgrade(dir.path())
        .args(["scan", "--test-id", "unit-1", "sheet-1.jpg", "sheet-2.jpg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graded 2 of 2 sheets"));

    let output = snapgrade(dir.path())
        .args(["stats", "--test-id", "unit-1", "--format", "json"])
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
}

#[test]
fn scan_rejects_student_id_for_several_images() {
    let dir = workspace_with_quiz();
    std::fs::write(dir.path().join("sheet-1.jpg"), b"not really a jpeg").unwrap();
    std::fs::write(dir.path().join("sheet-2.jpg"), b"not really a jpeg").unwrap();

    snapgrade(dir.path())
        .args([
            "scan",
            "--test-id",
            "unit-1",
            "--student-id",
            "ST1001",
            "sheet-1.jpg",
            "sheet-2.jpg",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("applies to one sheet"));

    snapgrade(dir.path())
        .args(["scan", "--test-id", "unit-1", "--student-id", "ST1001", "sheet-1.jpg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graded 1 of 1 sheets"));
}

#[test]
fn grade_skips_wrong_length_submission() {
    let dir = workspace_with_quiz();
    std::fs::write(
        dir.path().join("short.json"),
        r#"[{"student_name": "Carol", "student_id": "ST1003", "responses": ["A", "B"]},
            {"student_name": "Dan", "student_id": "ST1004", "responses": ["A", "B", "C", "D", "B"]}]"#,
    )
    .unwrap();

    snapgrade(dir.path())
        .args(["grade", "--test-id", "unit-1", "--submissions", "short.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graded 1 of 2 sheets"))
        .stdout(predicate::str::contains("does not match answer key length"));
}

#[test]
fn clear_removes_results() {
    let dir = workspace_with_quiz();
    grade_submissions(dir.path());

    snapgrade(dir.path())
        .args(["clear", "--test-id", "unit-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 result(s)"));

    snapgrade(dir.path())
        .args(["stats", "--test-id", "unit-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results yet"));
}

#[test]
fn unknown_test_id() {
    let dir = TempDir::new().unwrap();
    snapgrade(dir.path())
        .args(["stats", "--test-id", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("test 'missing' not found"));
}

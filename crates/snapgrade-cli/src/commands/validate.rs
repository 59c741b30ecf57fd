//! The `snapgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use snapgrade_core::parser;

pub fn execute(test_path: PathBuf) -> Result<()> {
    let tests = parser::load_tests(&test_path)?;
    anyhow::ensure!(
        !tests.is_empty(),
        "no valid test definitions found in {}",
        test_path.display()
    );

    let mut total_warnings = 0;

    for test in &tests {
        println!(
            "Test: {} [{}] ({} questions, pass at {}%)",
            test.title, test.id, test.total_questions, test.passing_score
        );

        let warnings = parser::validate_test(test);
        for w in &warnings {
            let prefix = w
                .question
                .map(|q| format!("  [Q{q}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    for id in parser::duplicate_ids(&tests) {
        println!("  WARNING: duplicate test id '{id}'");
        total_warnings += 1;
    }

    if total_warnings == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

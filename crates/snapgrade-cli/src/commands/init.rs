//! The `snapgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("snapgrade.toml").exists() {
        println!("snapgrade.toml already exists, skipping.");
    } else {
        std::fs::write("snapgrade.toml", SAMPLE_CONFIG)?;
        println!("Created snapgrade.toml");
    }

    std::fs::create_dir_all("tests")?;
    let example_path = std::path::Path::new("tests/example.toml");
    if example_path.exists() {
        println!("tests/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_TEST)?;
        println!("Created tests/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit tests/example.toml with your answer key");
    println!("  2. Run: snapgrade validate --test tests/example.toml");
    println!("  3. Run: snapgrade create --test tests/example.toml");
    println!("  4. Run: snapgrade scan --test-id example sheets/*.jpg");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# snapgrade configuration

data_dir = "./snapgrade-data"
default_passing_score = 70
default_template = "standard_25"
max_retries = 3
retry_delay_ms = 1000
parallelism = 4

# Demo mode fabricates plausible sheets; set a seed for repeatable runs.
[recognizer]
type = "demo"

# To use the bubble-detection backend instead:
# [recognizer]
# type = "backend"
# base_url = "${SNAPGRADE_BACKEND_URL}"
# timeout_secs = 30
"#;

const EXAMPLE_TEST: &str = r#"[test]
id = "example"
title = "Example Quiz"
description = "A five-question quiz to get started"
passing_score = 70
template = "simple_5"
answer_key = ["A", "B", "C", "D", "A"]
"#;

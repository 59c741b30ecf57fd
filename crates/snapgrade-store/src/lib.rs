//! snapgrade-store — Repositories for tests and graded results.
//!
//! `JsonDirRepository` keeps one JSON document per test and per result set
//! under a data directory; `MemoryRepository` keeps everything in process.

pub mod json_dir;
pub mod memory;

pub use json_dir::JsonDirRepository;
pub use memory::MemoryRepository;

/// Reject ids that cannot safely be used as file names.
pub(crate) fn check_id(id: &str) -> anyhow::Result<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        anyhow::bail!("invalid test id '{id}': use letters, digits, '-', '_' or '.'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_rules() {
        assert!(check_id("bio-midterm_2024.v2").is_ok());
        assert!(check_id("").is_err());
        assert!(check_id("../etc").is_err());
        assert!(check_id(".hidden").is_err());
        assert!(check_id("a/b").is_err());
    }
}

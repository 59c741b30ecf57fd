//! Bubble-sheet template catalog.
//!
//! A template describes the printed sheet layout: how many questions it has
//! and which choices each question offers. The recognition backend serves the
//! same catalog from `/templates`.

use serde::{Deserialize, Serialize};

use crate::model::Choice;

/// Template used when neither the test nor the config names one.
pub const DEFAULT_TEMPLATE_ID: &str = "standard_25";

/// A printable bubble-sheet layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleSheetTemplate {
    pub id: String,
    pub name: String,
    pub questions: usize,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub description: String,
}

impl BubbleSheetTemplate {
    fn builtin(id: &str, name: &str, questions: usize, choices: &[Choice], description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            questions,
            choices: choices.to_vec(),
            description: description.to_string(),
        }
    }

    /// Whether this layout can record the given answer.
    pub fn offers(&self, choice: Choice) -> bool {
        self.choices.contains(&choice)
    }
}

const FOUR: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

/// The built-in template catalog, in display order.
pub fn builtin_templates() -> Vec<BubbleSheetTemplate> {
    vec![
        BubbleSheetTemplate::builtin(
            "simple_5",
            "Simple 5 Questions",
            5,
            &FOUR,
            "5-question bubble sheet with A-D choices",
        ),
        BubbleSheetTemplate::builtin(
            "standard_25",
            "Standard 25 Questions",
            25,
            &FOUR,
            "Standard 25-question bubble sheet with A-D choices",
        ),
        BubbleSheetTemplate::builtin(
            "standard_50",
            "Standard 50 Questions",
            50,
            &FOUR,
            "Standard 50-question bubble sheet with A-D choices",
        ),
        BubbleSheetTemplate::builtin(
            "extended_100",
            "Extended 100 Questions",
            100,
            &Choice::ALL,
            "Extended 100-question bubble sheet with A-E choices",
        ),
    ]
}

/// Look up a built-in template by id.
pub fn find_template(id: &str) -> Option<BubbleSheetTemplate> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_default() {
        let t = find_template(DEFAULT_TEMPLATE_ID).unwrap();
        assert_eq!(t.questions, 25);
        assert!(t.offers(Choice::D));
        assert!(!t.offers(Choice::E));
    }

    #[test]
    fn extended_template_offers_e() {
        let t = find_template("extended_100").unwrap();
        assert_eq!(t.questions, 100);
        assert!(t.offers(Choice::E));
    }

    #[test]
    fn unknown_template() {
        assert!(find_template("standard_30").is_none());
    }
}

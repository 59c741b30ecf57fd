//! Demo recognizer: fabricates plausible sheets without a backend.
//!
//! Each question is answered correctly with probability 0.8; otherwise one of
//! the other A-D letters is chosen uniformly. Seed it for reproducible runs.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use snapgrade_core::templates::{builtin_templates, BubbleSheetTemplate};
use snapgrade_core::traits::{Recognition, RecognitionService, RecognizeRequest};

/// Probability that a fabricated answer matches the key.
pub const CORRECT_PROBABILITY: f64 = 0.8;

const WRONG_POOL: [&str; 4] = ["A", "B", "C", "D"];

const ROSTER: [&str; 10] = [
    "Alice Johnson",
    "Bob Smith",
    "Charlie Brown",
    "Diana Wilson",
    "Eva Martinez",
    "Frank Davis",
    "Grace Chen",
    "Henry Taylor",
    "Ivy Anderson",
    "Jack Thompson",
];

/// Random sheet generator for demos and offline use.
pub struct DemoRecognizer {
    rng: Mutex<StdRng>,
}

impl DemoRecognizer {
    /// A recognizer seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A recognizer that produces the same sheets for the same seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn fabricate(&self, request: &RecognizeRequest) -> Recognition {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let student_name = ROSTER.choose(&mut *rng).map(|s| s.to_string());
        let generated_id = format!("ST{}", rng.gen_range(1000..=9999));
        let student_id = request.student_id.clone().or(Some(generated_id));

        let mut responses = Vec::with_capacity(request.answer_key.len());
        let mut confidence = Vec::with_capacity(request.answer_key.len());
        for correct in &request.answer_key {
            let answer = if rng.gen_bool(CORRECT_PROBABILITY) {
                correct.clone()
            } else {
                let wrong: Vec<&str> = WRONG_POOL
                    .iter()
                    .copied()
                    .filter(|letter| *letter != correct.as_str())
                    .collect();
                wrong
                    .choose(&mut *rng)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| correct.clone())
            };
            responses.push(Some(answer));
            confidence.push(rng.gen_range(0.85..0.99));
        }

        Recognition {
            student_name,
            student_id,
            responses,
            confidence,
            processing_ms: rng.gen_range(400..1200),
        }
    }
}

impl Default for DemoRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionService for DemoRecognizer {
    fn name(&self) -> &str {
        "demo"
    }

    async fn recognize(&self, request: &RecognizeRequest) -> anyhow::Result<Recognition> {
        let recognition = self.fabricate(request);
        debug!(
            file = %request.image.file_name,
            questions = recognition.responses.len(),
            "fabricated demo sheet"
        );
        Ok(recognition)
    }

    async fn templates(&self) -> anyhow::Result<Vec<BubbleSheetTemplate>> {
        Ok(builtin_templates())
    }
}

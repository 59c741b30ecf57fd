//! Core trait definitions for recognition services and result storage.
//!
//! These async traits are implemented by the `snapgrade-recognition` and
//! `snapgrade-store` crates respectively. The scorer and analytics never call
//! them; only the grading engine does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Test;
use crate::results::ScanResult;
use crate::templates::BubbleSheetTemplate;

// ---------------------------------------------------------------------------
// Recognition service trait
// ---------------------------------------------------------------------------

/// Trait for backends that turn a photographed bubble sheet into responses.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Human-readable service name (e.g. "demo", "backend").
    fn name(&self) -> &str;

    /// Read the filled bubbles off one sheet.
    async fn recognize(&self, request: &RecognizeRequest) -> anyhow::Result<Recognition>;

    /// Templates the service knows how to read.
    async fn templates(&self) -> anyhow::Result<Vec<BubbleSheetTemplate>>;
}

/// A scanned sheet image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetImage {
    /// Original file name, e.g. `"sheet-03.jpg"`.
    pub file_name: String,
    /// MIME type, e.g. `"image/jpeg"`.
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SheetImage {
    /// Guess the MIME type from a file extension.
    pub fn content_type_for(file_name: &str) -> &'static str {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else if lower.ends_with(".gif") {
            "image/gif"
        } else if lower.ends_with(".bmp") {
            "image/bmp"
        } else {
            "image/jpeg"
        }
    }

    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = Self::content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

/// Request to recognise one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeRequest {
    pub image: SheetImage,
    /// The test's answer key as letters. The backend wants it alongside the
    /// image; the demo recognizer uses it to fabricate plausible sheets.
    pub answer_key: Vec<String>,
    /// Template the sheet was printed on.
    pub template_id: String,
    /// Student id supplied by the operator, if known before scanning.
    #[serde(default)]
    pub student_id: Option<String>,
}

/// What a recognition service read off a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    /// One entry per detected question; `None` is a blank bubble.
    pub responses: Vec<Option<String>>,
    /// Per-question detection confidence in `0.0..=1.0`, when reported.
    #[serde(default)]
    pub confidence: Vec<f64>,
    /// Time the service spent on the sheet.
    pub processing_ms: u64,
}

// ---------------------------------------------------------------------------
// Repository trait
// ---------------------------------------------------------------------------

/// Persistent storage for tests and their graded results.
///
/// Results are keyed by test id. Implementations must make `append_result`
/// atomic with respect to concurrent appends on the same test.
#[async_trait]
pub trait TestRepository: Send + Sync {
    async fn load_test(&self, id: &str) -> anyhow::Result<Option<Test>>;

    async fn save_test(&self, test: &Test) -> anyhow::Result<()>;

    async fn list_tests(&self) -> anyhow::Result<Vec<Test>>;

    /// All results for a test, in grading order. Empty if none were graded.
    async fn load_results(&self, test_id: &str) -> anyhow::Result<Vec<ScanResult>>;

    /// Append one result. Fails if the test does not exist.
    async fn append_result(&self, test_id: &str, result: &ScanResult) -> anyhow::Result<()>;

    /// Delete every result of a test, returning how many were removed.
    async fn clear_results(&self, test_id: &str) -> anyhow::Result<usize>;
}

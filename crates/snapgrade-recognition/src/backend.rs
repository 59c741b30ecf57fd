//! HTTP client for the bubble-detection backend.
//!
//! Endpoints: `GET /health`, `GET /templates`, `POST /process-image`.
//! The backend grades sheets itself, but only `student_answers` is used here;
//! scoring always happens locally.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use snapgrade_core::error::RecognitionError;
use snapgrade_core::templates::BubbleSheetTemplate;
use snapgrade_core::traits::{Recognition, RecognitionService, RecognizeRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Recognizer backed by the HTTP bubble-detection service.
pub struct BackendRecognizer {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl BackendRecognizer {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> RecognitionError {
        if e.is_timeout() {
            RecognitionError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            RecognitionError::Unavailable(self.base_url.clone())
        } else {
            RecognitionError::Network(e.to_string())
        }
    }

    /// Check that the backend is up.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn health(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::InvalidResponse(format!("health: {e}")))?;
        if health.status != "healthy" {
            return Err(RecognitionError::Unavailable(format!(
                "{} (status: {})",
                self.base_url, health.status
            ))
            .into());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct TemplatesResponse {
    templates: Vec<BubbleSheetTemplate>,
}

#[derive(Deserialize)]
struct ProcessingResult {
    success: bool,
    #[serde(default)]
    student_answers: Vec<String>,
    #[serde(default)]
    confidence_scores: Vec<f64>,
    /// Seconds.
    #[serde(default)]
    processing_time: f64,
    #[serde(default)]
    student_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Body of a 400 from sheet processing.
#[derive(Deserialize)]
struct ErrorResult {
    error: String,
    error_code: String,
}

/// Body of framework-level errors (`HTTPException`).
#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

fn status_error(status: u16, body: &str) -> RecognitionError {
    if let Ok(failed) = serde_json::from_str::<ErrorResult>(body) {
        return RecognitionError::ProcessingFailed {
            code: failed.error_code,
            message: failed.error,
        };
    }
    let message = serde_json::from_str::<ErrorDetail>(body)
        .map(|d| d.detail)
        .unwrap_or_else(|_| body.to_string());
    if status >= 500 {
        RecognitionError::ServerError { status, message }
    } else {
        RecognitionError::Rejected { status, message }
    }
}

fn into_recognition(result: ProcessingResult) -> Result<Recognition, RecognitionError> {
    if !result.success {
        return Err(RecognitionError::ProcessingFailed {
            code: result.error_code.unwrap_or_else(|| "UNKNOWN".into()),
            message: result.error.unwrap_or_default(),
        });
    }

    // The detector reports an undetected bubble as an empty string
    let responses = result
        .student_answers
        .into_iter()
        .map(|a| {
            let a = a.trim().to_string();
            if a.is_empty() {
                None
            } else {
                Some(a)
            }
        })
        .collect();

    Ok(Recognition {
        student_name: None,
        student_id: result.student_id,
        responses,
        confidence: result.confidence_scores,
        processing_ms: (result.processing_time.max(0.0) * 1000.0).round() as u64,
    })
}

#[async_trait]
impl RecognitionService for BackendRecognizer {
    fn name(&self) -> &str {
        "backend"
    }

    #[instrument(skip(self, request), fields(file = %request.image.file_name, template = %request.template_id))]
    async fn recognize(&self, request: &RecognizeRequest) -> anyhow::Result<Recognition> {
        let start = Instant::now();

        let answer_key = serde_json::to_string(&request.answer_key)?;
        let file = Part::bytes(request.image.bytes.clone())
            .file_name(request.image.file_name.clone())
            .mime_str(&request.image.content_type)
            .with_context(|| format!("invalid content type '{}'", request.image.content_type))?;

        let mut form = Form::new()
            .part("file", file)
            .text("answer_key", answer_key)
            .text("template_id", request.template_id.clone());
        if let Some(id) = &request.student_id {
            form = form.text("student_id", id.clone());
        }

        let response = self
            .client
            .post(format!("{}/process-image", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let result: ProcessingResult = response
            .json()
            .await
            .map_err(|e| RecognitionError::InvalidResponse(e.to_string()))?;
        let recognition = into_recognition(result)?;

        debug!(
            questions = recognition.responses.len(),
            backend_ms = recognition.processing_ms,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sheet recognised"
        );
        Ok(recognition)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn templates(&self) -> anyhow::Result<Vec<BubbleSheetTemplate>> {
        let response = self
            .client
            .get(format!("{}/templates", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let body: TemplatesResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::InvalidResponse(format!("templates: {e}")))?;
        Ok(body.templates)
    }
}

//! Grading engine orchestrator.
//!
//! Runs a batch of scanned sheets through a recognition service with bounded
//! parallelism and retries, grades each response sequence against the test's
//! answer key, and appends the results to the repository in sheet order.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::RecognitionError;
use crate::model::{Submission, Test};
use crate::results::ScanResult;
use crate::templates::DEFAULT_TEMPLATE_ID;
use crate::traits::{RecognitionService, RecognizeRequest, SheetImage, TestRepository};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Maximum concurrent recognition requests.
    pub parallelism: usize,
    /// Retries on transient recognition errors.
    pub max_retries_per_sheet: u32,
    /// Delay before the first retry; doubles on each attempt.
    pub retry_delay: Duration,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries_per_sheet: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_sheet_start(&self, file_name: &str, attempt: u32);
    fn on_sheet_graded(&self, file_name: &str, result: &ScanResult);
    fn on_sheet_error(&self, file_name: &str, error: &str);
    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_sheet_start(&self, _: &str, _: u32) {}
    fn on_sheet_graded(&self, _: &str, _: &ScanResult) {}
    fn on_sheet_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A sheet that could not be graded.
#[derive(Debug, Clone)]
pub struct SheetFailure {
    pub file_name: String,
    pub error: String,
}

/// Outcome of grading a batch of sheets or submissions.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Results appended to the repository, in input order.
    pub graded: Vec<ScanResult>,
    pub failures: Vec<SheetFailure>,
    pub duration_ms: u64,
}

/// The central grading engine.
pub struct GradingEngine {
    recognizer: Arc<dyn RecognitionService>,
    repository: Arc<dyn TestRepository>,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(
        recognizer: Arc<dyn RecognitionService>,
        repository: Arc<dyn TestRepository>,
        config: GradingEngineConfig,
    ) -> Self {
        Self {
            recognizer,
            repository,
            config,
        }
    }

    /// Recognise, grade, and store a batch of scanned sheets.
    ///
    /// A sheet that fails recognition or has the wrong number of responses is
    /// reported and skipped; the rest of the batch is unaffected. Storage
    /// failures abort the batch.
    ///
    /// `student_id` identifies a single sheet, so it is only accepted for a
    /// batch of one.
    pub async fn grade_batch(
        &self,
        test: &Test,
        sheets: Vec<SheetImage>,
        student_id: Option<String>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome> {
        if student_id.is_some() && sheets.len() > 1 {
            anyhow::bail!(
                "a student id applies to one sheet, but {} were given",
                sheets.len()
            );
        }

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let answer_key = test.answer_key.to_letters();
        let template_id = test
            .template_id
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE_ID.to_string());

        tracing::info!(
            test_id = %test.id,
            sheets = sheets.len(),
            recognizer = self.recognizer.name(),
            "grading batch"
        );

        let mut futures = FuturesUnordered::new();
        let total = sheets.len();

        for (index, image) in sheets.into_iter().enumerate() {
            let recognizer = Arc::clone(&self.recognizer);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let request = RecognizeRequest {
                image,
                answer_key: answer_key.clone(),
                template_id: template_id.clone(),
                student_id: student_id.clone(),
            };

            futures.push(async move {
                let file_name = request.image.file_name.clone();
                let outcome = async {
                    let _permit = semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    recognize_with_retry(recognizer.as_ref(), &request, &config, progress).await
                }
                .await;
                (index, file_name, request.student_id, outcome)
            });
        }

        let mut recognized = Vec::with_capacity(total);
        let mut failures = Vec::new();

        while let Some((index, file_name, requested_id, outcome)) = futures.next().await {
            match outcome {
                Ok(recognition) => {
                    let submission = Submission {
                        student_name: recognition
                            .student_name
                            .unwrap_or_else(|| file_stem(&file_name)),
                        student_id: recognition
                            .student_id
                            .or(requested_id)
                            .unwrap_or_default(),
                        responses: recognition.responses,
                    };
                    recognized.push((index, file_name, submission));
                }
                Err(e) => {
                    tracing::warn!("recognition failed for {file_name}: {e:#}");
                    progress.on_sheet_error(&file_name, &format!("{e:#}"));
                    failures.push(SheetFailure {
                        file_name,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        recognized.sort_by_key(|(index, _, _)| *index);
        let mut graded = Vec::with_capacity(recognized.len());
        for (_, file_name, submission) in recognized {
            match self.grade_one(test, &submission).await? {
                Ok(result) => {
                    progress.on_sheet_graded(&file_name, &result);
                    graded.push(result);
                }
                Err(message) => {
                    progress.on_sheet_error(&file_name, &message);
                    failures.push(SheetFailure {
                        file_name,
                        error: message,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, graded.len(), failures.len(), elapsed);

        Ok(BatchOutcome {
            graded,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Grade responses that were recognised elsewhere.
    pub async fn grade_submissions(
        &self,
        test: &Test,
        submissions: &[Submission],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome> {
        let start = Instant::now();
        let mut outcome = BatchOutcome::default();

        for (i, submission) in submissions.iter().enumerate() {
            let label = if submission.student_id.is_empty() {
                format!("submission #{}", i + 1)
            } else {
                submission.student_id.clone()
            };
            match self.grade_one(test, submission).await? {
                Ok(result) => {
                    progress.on_sheet_graded(&label, &result);
                    outcome.graded.push(result);
                }
                Err(message) => {
                    progress.on_sheet_error(&label, &message);
                    outcome.failures.push(SheetFailure {
                        file_name: label,
                        error: message,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(
            submissions.len(),
            outcome.graded.len(),
            outcome.failures.len(),
            elapsed,
        );
        outcome.duration_ms = elapsed.as_millis() as u64;
        Ok(outcome)
    }

    /// Grade and store one submission. The outer error aborts the batch
    /// (storage failure or a broken test), the inner one skips the sheet.
    async fn grade_one(
        &self,
        test: &Test,
        submission: &Submission,
    ) -> Result<std::result::Result<ScanResult, String>> {
        match ScanResult::grade(&test.answer_key, submission, test.passing_score, Utc::now()) {
            Ok(result) => {
                self.repository.append_result(&test.id, &result).await?;
                tracing::debug!(
                    test_id = %test.id,
                    student_id = %result.student_id,
                    percentage = result.percentage,
                    "graded sheet"
                );
                Ok(Ok(result))
            }
            Err(e) if e.is_per_submission() => {
                tracing::warn!(test_id = %test.id, "skipping submission: {e}");
                Ok(Err(e.to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("test '{}' cannot be graded", test.id))),
        }
    }
}

async fn recognize_with_retry(
    recognizer: &dyn RecognitionService,
    request: &RecognizeRequest,
    config: &GradingEngineConfig,
    progress: &dyn ProgressReporter,
) -> Result<crate::traits::Recognition> {
    let mut last_error = None;
    let mut retry_delay = config.retry_delay;

    for retry in 0..=config.max_retries_per_sheet {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
        }
        progress.on_sheet_start(&request.image.file_name, retry + 1);

        match recognizer.recognize(request).await {
            Ok(recognition) => return Ok(recognition),
            Err(e) => {
                let permanent = e
                    .downcast_ref::<RecognitionError>()
                    .is_some_and(RecognitionError::is_permanent);
                if permanent {
                    return Err(e);
                }
                tracing::debug!(
                    "recognition attempt {} for {} failed: {e}",
                    retry + 1,
                    request.image.file_name
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

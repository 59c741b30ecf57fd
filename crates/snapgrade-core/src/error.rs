//! Grading and recognition error types.
//!
//! `score` itself can only fail with [`GradeError::ShapeMismatch`]. The other
//! variants guard the invariants of answer keys and tests at construction time,
//! so a key that made it into a `Test` is always gradable.

use thiserror::Error;

/// Errors raised while building answer keys or grading a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    /// The response sequence does not have one entry per question.
    #[error("response count {actual} does not match answer key length {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// An answer key must contain at least one question.
    #[error("answer key is empty")]
    EmptyAnswerKey,

    /// A letter outside the A-E alphabet was used in an answer key.
    #[error("invalid answer choice: {0:?} (expected one of A, B, C, D, E)")]
    InvalidChoice(String),

    /// The declared question count disagrees with the answer key.
    #[error("test declares {declared} questions but the answer key has {actual}")]
    KeyLengthMismatch { declared: usize, actual: usize },

    /// Passing scores are percentages.
    #[error("passing score {0} is out of range (0-100)")]
    InvalidPassingScore(u32),
}

impl GradeError {
    /// Returns `true` if the error concerns a single submission rather than the
    /// test definition, i.e. the caller may skip the sheet and keep going.
    pub fn is_per_submission(&self) -> bool {
        matches!(self, GradeError::ShapeMismatch { .. })
    }
}

/// Errors that can occur when talking to a recognition service.
///
/// Defined here so the grading engine can classify failures for retry
/// decisions without string matching.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The service could not be reached at all.
    #[error("recognition service unavailable at {0}")]
    Unavailable(String),

    /// The service refused the request (bad image, bad key, unknown template).
    #[error("recognition rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service accepted the image but could not read the sheet.
    #[error("sheet processing failed [{code}]: {message}")]
    ProcessingFailed { code: String, message: String },

    /// The service returned a 5xx response.
    #[error("recognition server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// The request timed out.
    #[error("recognition timed out after {0}s")]
    Timeout(u64),

    /// A transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("invalid recognition response: {0}")]
    InvalidResponse(String),
}

impl RecognitionError {
    /// Returns `true` if retrying the same sheet cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RecognitionError::Rejected { .. }
                | RecognitionError::ProcessingFailed { .. }
                | RecognitionError::InvalidResponse(_)
        )
    }
}

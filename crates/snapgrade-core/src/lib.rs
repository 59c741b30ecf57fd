//! snapgrade-core — Answer-key scoring, class analytics, and the grading engine.
//!
//! This crate defines the data model, the scorer, the analytics, and the
//! traits that recognition services and result stores implement.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod statistics;
pub mod templates;
pub mod traits;

pub use error::{GradeError, RecognitionError};
pub use model::{AnswerKey, Choice, Submission, Test};
pub use results::{score, ScanResult, Score};
pub use statistics::{class_statistics, question_statistics, ClassStatistics, QuestionStatistic};

//! snapgrade-recognition — Bubble-sheet recognition services.
//!
//! Implements the `RecognitionService` trait for a local demo generator and
//! the HTTP bubble-detection backend, plus a scripted double for tests.

pub mod backend;
pub mod config;
pub mod demo;
pub mod scripted;

pub use backend::BackendRecognizer;
pub use config::{create_recognizer, load_config, RecognizerConfig, SnapgradeConfig};
pub use demo::DemoRecognizer;
pub use scripted::{ScriptStep, ScriptedRecognizer};
pub use snapgrade_core::error::RecognitionError;

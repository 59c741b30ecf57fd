//! Scripted recognizer for testing the grading pipeline without a backend.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use snapgrade_core::error::RecognitionError;
use snapgrade_core::templates::{builtin_templates, BubbleSheetTemplate};
use snapgrade_core::traits::{Recognition, RecognitionService, RecognizeRequest};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return these responses.
    Respond {
        student_name: Option<String>,
        responses: Vec<Option<String>>,
    },
    /// Fail with a retryable network error.
    Transient(String),
    /// Fail with a permanent rejection.
    Permanent(String),
}

impl ScriptStep {
    /// A reply from compact letters, where `-` or `.` is a blank.
    pub fn letters(compact: &str) -> Self {
        let responses = compact
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '-' | '.' => None,
                other => Some(other.to_string()),
            })
            .collect();
        ScriptStep::Respond {
            student_name: None,
            responses,
        }
    }

    /// Attach a student name to a `Respond` step.
    pub fn named(self, name: &str) -> Self {
        match self {
            ScriptStep::Respond { responses, .. } => ScriptStep::Respond {
                student_name: Some(name.to_string()),
                responses,
            },
            other => other,
        }
    }
}

#[derive(Default)]
struct Script {
    by_file: HashMap<String, VecDeque<ScriptStep>>,
    fallback: VecDeque<ScriptStep>,
}

/// Returns preconfigured replies in order.
///
/// Steps queued for a file name are consumed first; after that, the shared
/// queue is used. Running out of steps is an error.
pub struct ScriptedRecognizer {
    script: Mutex<Script>,
    call_count: AtomicU32,
    last_request: Mutex<Option<RecognizeRequest>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue a step for any sheet.
    pub fn then(self, step: ScriptStep) -> Self {
        self.lock_script().fallback.push_back(step);
        self
    }

    /// Queue a step for the sheet with this file name.
    pub fn on_file(self, file_name: &str, step: ScriptStep) -> Self {
        self.lock_script()
            .by_file
            .entry(file_name.to_string())
            .or_default()
            .push_back(step);
        self
    }

    /// Number of `recognize` calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecognizeRequest> {
        match self.last_request.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn next_step(&self, file_name: &str) -> Option<ScriptStep> {
        let mut script = self.lock_script();
        if let Some(step) = script.by_file.get_mut(file_name).and_then(|q| q.pop_front()) {
            return Some(step);
        }
        script.fallback.pop_front()
    }
}

impl Default for ScriptedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionService for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, request: &RecognizeRequest) -> anyhow::Result<Recognition> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let file_name = &request.image.file_name;
        match self.next_step(file_name) {
            Some(ScriptStep::Respond {
                student_name,
                responses,
            }) => Ok(Recognition {
                student_name,
                student_id: request.student_id.clone(),
                responses,
                confidence: vec![],
                processing_ms: 1,
            }),
            Some(ScriptStep::Transient(message)) => Err(RecognitionError::Network(message).into()),
            Some(ScriptStep::Permanent(message)) => Err(RecognitionError::Rejected {
                status: 400,
                message,
            }
            .into()),
            None => Err(RecognitionError::InvalidResponse(format!(
                "no scripted reply left for {file_name}"
            ))
            .into()),
        }
    }

    async fn templates(&self) -> anyhow::Result<Vec<BubbleSheetTemplate>> {
        Ok(builtin_templates())
    }
}

//! Text-generation stubs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use vitalis_protocol::{GenerationError, TextGenerator};

/// Generator that always returns the same text.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    response: String,
}

impl FixedGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

/// Generator that always fails.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    reason: String,
}

impl FailingGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Failed(self.reason.clone()))
    }
}

/// Generator that replays a script of responses, repeating the last one
/// once the script is exhausted.
#[derive(Clone)]
pub struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<String>>>,
    last: Arc<Mutex<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<String>) -> Self {
        let last = responses.last().cloned().unwrap_or_default();
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            last: Arc::new(Mutex::new(last)),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, GenerationError> {
        if let Some(next) = self.responses.lock().pop_front() {
            *self.last.lock() = next.clone();
            return Ok(next);
        }
        Ok(self.last.lock().clone())
    }
}

/// Generator that records every prompt it receives.
#[derive(Clone)]
pub struct RecordingGenerator {
    response: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingGenerator {
    /// Create the generator and a handle to the recorded prompts.
    pub fn new(response: impl Into<String>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                response: response.into(),
                prompts: prompts.clone(),
            },
            prompts,
        )
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(format!("{prompt}\n---\n{context}"));
        Ok(self.response.clone())
    }
}

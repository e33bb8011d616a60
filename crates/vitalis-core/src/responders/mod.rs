//! Specialized responders and their registry.

mod diagnosis;
mod general;
mod medication;
mod report;
mod symptom;
mod tracking;

pub use diagnosis::DiagnosisResponder;
pub use general::GeneralResponder;
pub use medication::MedicationResponder;
pub use report::ReportResponder;
pub use symptom::SymptomResponder;
pub use tracking::TrackingResponder;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use vitalis_memory::{MemorySummary, MemoryWindow};
use vitalis_protocol::{
    ConversationId, GenerationError, Intent, SafetyVerdict, UserId, UserProfile,
};

/// Per-turn inputs shared by every responder.
pub struct ResponderContext<'a> {
    /// User the turn belongs to.
    pub user_id: UserId,
    /// Conversation the turn belongs to.
    pub conversation_id: ConversationId,
    /// The incoming message.
    pub user_text: &'a str,
    /// Recent turns.
    pub window: &'a MemoryWindow,
    /// Long-term summaries recalled for this message; advisory only.
    pub summaries: &'a [MemorySummary],
    /// Extracted text of the referenced document, when ready.
    pub document_text: Option<&'a str>,
    /// Medical profile supplied by the caller.
    pub profile: Option<&'a UserProfile>,
}

/// Output of one responder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponderReply {
    /// Reply text shown to the user.
    pub text: String,
    /// Structured hints for the extractor (`symptoms`, `vital_signs`,
    /// `medications` arrays).
    pub structured_hints: serde_json::Value,
    /// Medication safety verdict, when computed.
    pub safety_verdict: Option<SafetyVerdict>,
}

impl ResponderReply {
    /// Build a plain text reply with no hints.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured_hints: serde_json::json!({}),
            safety_verdict: None,
        }
    }
}

/// Errors raised by a responder; contained at the dispatch boundary.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The referenced document's text is not available yet.
    #[error("document text not available yet")]
    MissingDocument,
    /// The generation capability failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// A persisted-store read failed.
    #[error("store error: {0}")]
    Store(String),
}

/// A capability implementation producing a reply for one intent.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Intent the responder is registered for.
    fn intent(&self) -> Intent;

    /// Produce a reply for the turn.
    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError>;
}

/// Closed registry mapping intents to responder implementations.
#[derive(Clone, Default)]
pub struct ResponderRegistry {
    responders: HashMap<Intent, Arc<dyn Responder>>,
}

impl ResponderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a responder under its own intent.
    pub fn register(&mut self, responder: Arc<dyn Responder>) {
        self.responders.insert(responder.intent(), responder);
    }

    /// Fetch the responder for an intent.
    pub fn get(&self, intent: Intent) -> Option<Arc<dyn Responder>> {
        self.responders.get(&intent).cloned()
    }

    /// Registered intents.
    pub fn intents(&self) -> Vec<Intent> {
        self.responders.keys().copied().collect()
    }
}

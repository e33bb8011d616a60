//! Error types for the core orchestrator crate.

use thiserror::Error;
use vitalis_protocol::Intent;

/// Turn-level errors returned by orchestrator operations.
///
/// Everything else in the pipeline degrades in place: classification
/// falls back to `general`, responder failures reroute to the fallback
/// responder, extraction and summarization failures are logged. Only
/// these variants abort a turn.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persisting the turn pair failed; nothing was made visible.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// No responder is registered for an intent.
    #[error("no responder registered for intent: {0}")]
    UnknownResponder(Intent),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

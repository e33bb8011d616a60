//! Error types for knowledge gateway internals.
//!
//! These never cross the gateway boundary: provider failures are
//! normalized into `KnowledgeOutcome::Unavailable` before callers see
//! them.

use thiserror::Error;

/// Errors produced while querying a provider.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider answered with a non-success status.
    #[error("provider returned status {0}")]
    Status(u16),
    /// Provider payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Provider answered but had no matching data.
    #[error("no results")]
    NoResults,
}

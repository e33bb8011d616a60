//! Error types for memory operations.

/// Errors returned by the memory store and summarizer.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Summary generation failed after retries.
    #[error("summarization failed: {0}")]
    Summarization(String),
    /// Embedding the summary text failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

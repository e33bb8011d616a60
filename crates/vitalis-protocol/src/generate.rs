//! Capability traits consumed from external collaborators.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the generation and embedding capabilities.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The upstream model call failed.
    #[error("generation failed: {0}")]
    Failed(String),
    /// The upstream model call timed out.
    #[error("generation timed out")]
    Timeout,
}

/// Opaque text-generation capability.
///
/// The orchestrator never inspects how text is produced; it only relies
/// on the contract that a prompt plus context yields generated text or a
/// [`GenerationError`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt with supporting context.
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError>;
}

/// Opaque text-embedding capability used for semantic memory recall.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed text into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError>;
}

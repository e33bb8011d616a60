//! Text-embedding stubs.

use async_trait::async_trait;
use vitalis_protocol::{GenerationError, TextEmbedder};

/// Deterministic embedder hashing tokens into a fixed-size vector.
///
/// Texts sharing tokens land near each other, which is enough to make
/// similarity recall meaningful in tests.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimensions: usize,
}

impl StubEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

#[async_trait]
impl TextEmbedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let mut hash: u64 = 1469598103934665603;
            for byte in token.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(1099511628211);
            }
            vector[(hash as usize) % self.dimensions] += 1.0;
        }
        Ok(vector)
    }
}

/// Embedder that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl TextEmbedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, GenerationError> {
        Err(GenerationError::Failed("embedder down".to_string()))
    }
}

//! Summary record model for the long-term archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vitalis_protocol::ConversationId;

/// A condensed digest of a contiguous block of turns.
///
/// Immutable once created; retrieved by embedding similarity, never by
/// exact key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemorySummary {
    /// Summary identifier.
    pub id: Uuid,
    /// Conversation the summarized turns belong to.
    pub conversation_id: ConversationId,
    /// Natural-language digest text.
    pub text: String,
    /// Embedding vector; empty when embedding was unavailable, in which
    /// case the summary is excluded from similarity recall.
    pub embedding: Vec<f32>,
    /// First covered turn sequence number (1-based).
    pub from_seq: u64,
    /// Last covered turn sequence number (inclusive).
    pub to_seq: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MemorySummary {
    /// Build a summary with a fresh id and current timestamp.
    pub fn new(
        conversation_id: ConversationId,
        text: impl Into<String>,
        embedding: Vec<f32>,
        from_seq: u64,
        to_seq: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            text: text.into(),
            embedding,
            from_seq,
            to_seq,
            created_at: Utc::now(),
        }
    }
}

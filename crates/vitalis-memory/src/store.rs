//! Summary archive implementations.

use crate::error::MemoryError;
use crate::model::MemorySummary;
use crate::recall::{RecallOptions, cosine_similarity};
use async_trait::async_trait;
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use vitalis_protocol::ConversationId;

/// Long-term summary archive used by the orchestrator.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Append a summary record.
    async fn store(&self, summary: MemorySummary) -> Result<(), MemoryError>;

    /// Load all summaries for a conversation in creation order.
    async fn list(&self, conversation_id: ConversationId)
    -> Result<Vec<MemorySummary>, MemoryError>;

    /// Recall the summaries most similar to a query embedding.
    ///
    /// Summaries with empty embeddings are skipped; the result is
    /// advisory context and may legitimately be empty.
    async fn recall(
        &self,
        conversation_id: ConversationId,
        query_embedding: &[f32],
        options: RecallOptions,
    ) -> Result<Vec<MemorySummary>, MemoryError> {
        let mut scored: Vec<(f32, MemorySummary)> = self
            .list(conversation_id)
            .await?
            .into_iter()
            .filter(|summary| !summary.embedding.is_empty())
            .map(|summary| {
                let score = cosine_similarity(query_embedding, &summary.embedding);
                (score, summary)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(min_score) = options.min_score {
            scored.retain(|(score, _)| *score >= min_score);
        }
        scored.truncate(options.k);
        Ok(scored.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Highest turn sequence number already covered by a summary.
    async fn last_covered_seq(
        &self,
        conversation_id: ConversationId,
    ) -> Result<u64, MemoryError> {
        let summaries = self.list(conversation_id).await?;
        Ok(summaries.iter().map(|summary| summary.to_seq).max().unwrap_or(0))
    }
}

/// File-backed summary store writing JSONL records per conversation.
#[derive(Debug, Clone)]
pub struct FileSummaryStore {
    /// Root directory for summary files.
    root: PathBuf,
}

impl FileSummaryStore {
    /// Create a new file-backed store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file summary store (root={})", root.display());
        Ok(Self { root })
    }

    /// Path to the conversation JSONL file.
    fn conversation_path(&self, conversation_id: ConversationId) -> PathBuf {
        self.root.join(format!("{conversation_id}.jsonl"))
    }

    /// Load all records for a conversation.
    fn load_records(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MemorySummary>, MemoryError> {
        let path = self.conversation_path(conversation_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: MemorySummary = serde_json::from_str(&line)?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl SummaryStore for FileSummaryStore {
    /// Store a summary by appending to the conversation file.
    async fn store(&self, summary: MemorySummary) -> Result<(), MemoryError> {
        let path = self.conversation_path(summary.conversation_id);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(&summary)?;
        writeln!(file, "{line}")?;
        debug!(
            "stored summary (conversation_id={}, covered={}..={}, text_len={})",
            summary.conversation_id,
            summary.from_seq,
            summary.to_seq,
            summary.text.len()
        );
        Ok(())
    }

    async fn list(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MemorySummary>, MemoryError> {
        self.load_records(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileSummaryStore, SummaryStore};
    use crate::model::MemorySummary;
    use crate::recall::RecallOptions;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn summary(
        conversation_id: Uuid,
        text: &str,
        embedding: Vec<f32>,
        range: (u64, u64),
    ) -> MemorySummary {
        MemorySummary::new(conversation_id, text, embedding, range.0, range.1)
    }

    #[tokio::test]
    async fn store_and_list_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = FileSummaryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();

        let first = summary(conversation_id, "block one", vec![1.0, 0.0], (1, 10));
        let second = summary(conversation_id, "block two", vec![0.0, 1.0], (11, 20));
        store.store(first.clone()).await.expect("store first");
        store.store(second.clone()).await.expect("store second");

        let listed = store.list(conversation_id).await.expect("list");
        assert_eq!(listed, vec![first, second]);
        assert_eq!(
            store.last_covered_seq(conversation_id).await.expect("seq"),
            20
        );
    }

    #[tokio::test]
    async fn recall_ranks_by_similarity_and_skips_unembedded() {
        let temp = tempdir().expect("tempdir");
        let store = FileSummaryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();

        store
            .store(summary(conversation_id, "close", vec![1.0, 0.1], (1, 4)))
            .await
            .expect("store");
        store
            .store(summary(conversation_id, "far", vec![0.0, 1.0], (5, 8)))
            .await
            .expect("store");
        store
            .store(summary(conversation_id, "unembedded", Vec::new(), (9, 12)))
            .await
            .expect("store");

        let recalled = store
            .recall(
                conversation_id,
                &[1.0, 0.0],
                RecallOptions {
                    k: 2,
                    min_score: None,
                },
            )
            .await
            .expect("recall");
        let texts: Vec<&str> = recalled.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["close", "far"]);
    }

    #[tokio::test]
    async fn recall_on_empty_conversation_returns_nothing() {
        let temp = tempdir().expect("tempdir");
        let store = FileSummaryStore::new(temp.path()).expect("store");
        let recalled = store
            .recall(Uuid::new_v4(), &[1.0], RecallOptions::default())
            .await
            .expect("recall");
        assert_eq!(recalled.len(), 0);
        assert_eq!(
            store.last_covered_seq(Uuid::new_v4()).await.expect("seq"),
            0
        );
    }
}

//! Cadence summarization of turn blocks.

use crate::error::MemoryError;
use crate::model::MemorySummary;
use crate::store::SummaryStore;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use vitalis_protocol::{ConversationId, TextEmbedder, TextGenerator, Turn};

const SUMMARY_PROMPT: &str = "Summarize the following health conversation excerpt in a few \
sentences. Keep reported symptoms, medications, measurements and decisions; drop filler.";

/// Options controlling summarization behavior.
#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    /// Maximum summary length in characters.
    pub max_chars: usize,
    /// Maximum generation attempts before the mechanical fallback.
    pub max_attempts: u32,
    /// Initial backoff delay; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Produces and archives one summary per turn block.
///
/// Runs detached from the reply path; a failed run never loses turns,
/// only delays the compressed long-term view.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn SummaryStore>,
    options: SummarizerOptions,
}

impl Summarizer {
    /// Create a summarizer over the given capabilities and archive.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<dyn SummaryStore>,
        options: SummarizerOptions,
    ) -> Self {
        Self {
            generator,
            embedder,
            store,
            options,
        }
    }

    /// Summarize an immutable snapshot of turns covering
    /// `from_seq..=to_seq` and archive the result.
    pub async fn summarize_block(
        &self,
        conversation_id: ConversationId,
        turns: &[Turn],
        from_seq: u64,
        to_seq: u64,
    ) -> Result<MemorySummary, MemoryError> {
        if turns.is_empty() {
            return Err(MemoryError::Summarization("empty turn block".to_string()));
        }
        debug!(
            "summarizing block (conversation_id={}, turns={}, range={}..={})",
            conversation_id,
            turns.len(),
            from_seq,
            to_seq
        );
        let rendered = render_turns(turns);
        let text = self.generate_with_retry(&rendered).await;
        let text = truncate_chars(&text, self.options.max_chars);
        let embedding = match self.embedder.embed(&text).await {
            Ok(embedding) => embedding,
            Err(err) => {
                // Keep the text digest; an empty vector excludes it from
                // similarity recall until re-embedding becomes possible.
                warn!(
                    "summary embedding failed, storing without vector (conversation_id={}): {err}",
                    conversation_id
                );
                Vec::new()
            }
        };
        let summary = MemorySummary::new(conversation_id, text, embedding, from_seq, to_seq);
        self.store.store(summary.clone()).await?;
        info!(
            "archived summary (conversation_id={}, range={}..={})",
            conversation_id, from_seq, to_seq
        );
        Ok(summary)
    }

    /// Call the generator with exponential backoff, falling back to a
    /// mechanical digest when every attempt fails.
    async fn generate_with_retry(&self, rendered: &str) -> String {
        let mut delay = self.options.base_delay;
        for attempt in 1..=self.options.max_attempts {
            match self.generator.generate(SUMMARY_PROMPT, rendered).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("summary generation returned empty text (attempt={attempt})"),
                Err(err) => warn!("summary generation failed (attempt={attempt}): {err}"),
            }
            if attempt < self.options.max_attempts {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
        fallback_digest(rendered)
    }
}

/// Render turns as `role: text` lines.
fn render_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mechanical digest used when generation is unavailable.
fn fallback_digest(rendered: &str) -> String {
    format!("Conversation excerpt (verbatim digest):\n{rendered}")
}

/// Truncate a string to a maximum character count.
fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{Summarizer, SummarizerOptions};
    use crate::store::{FileSummaryStore, SummaryStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;
    use uuid::Uuid;
    use vitalis_protocol::{Role, Turn};
    use vitalis_test_utils::{FailingGenerator, FixedGenerator, StubEmbedder};

    fn turns(conversation_id: Uuid) -> Vec<Turn> {
        vec![
            Turn::new(conversation_id, Role::User, "my head hurts"),
            Turn::new(conversation_id, Role::Assistant, "how long has it hurt?"),
        ]
    }

    fn options() -> SummarizerOptions {
        SummarizerOptions {
            max_chars: 200,
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn summarize_block_archives_generated_digest() {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(FileSummaryStore::new(temp.path()).expect("store"));
        let summarizer = Summarizer::new(
            Arc::new(FixedGenerator::new("headache discussed")),
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            options(),
        );
        let conversation_id = Uuid::new_v4();

        let summary = summarizer
            .summarize_block(conversation_id, &turns(conversation_id), 1, 2)
            .await
            .expect("summarize");
        assert_eq!(summary.text, "headache discussed");
        assert_eq!(summary.embedding.len(), 8);

        let listed = store.list(conversation_id).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].from_seq, 1);
        assert_eq!(listed[0].to_seq, 2);
    }

    #[tokio::test]
    async fn summarize_block_falls_back_when_generation_fails() {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(FileSummaryStore::new(temp.path()).expect("store"));
        let summarizer = Summarizer::new(
            Arc::new(FailingGenerator::new("model down")),
            Arc::new(StubEmbedder::new(4)),
            store.clone(),
            options(),
        );
        let conversation_id = Uuid::new_v4();

        let summary = summarizer
            .summarize_block(conversation_id, &turns(conversation_id), 1, 2)
            .await
            .expect("summarize");
        assert!(summary.text.contains("my head hurts"));
        assert!(summary.text.starts_with("Conversation excerpt"));
    }

    #[tokio::test]
    async fn summarize_block_rejects_empty_snapshot() {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(FileSummaryStore::new(temp.path()).expect("store"));
        let summarizer = Summarizer::new(
            Arc::new(FixedGenerator::new("unused")),
            Arc::new(StubEmbedder::new(4)),
            store,
            options(),
        );
        let err = summarizer
            .summarize_block(Uuid::new_v4(), &[], 1, 0)
            .await
            .expect_err("empty block");
        assert!(err.to_string().contains("empty turn block"));
    }
}

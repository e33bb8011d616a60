//! Orchestrator core: drives one conversational turn to completion.

mod locks;

use crate::classifier::IntentClassifier;
use crate::error::CoreError;
use crate::extractor::{FactOrigin, StructuredExtractor};
use crate::facts::{FactStore, FactWindow};
use crate::history::HistoryStore;
use crate::responders::{
    DiagnosisResponder, GeneralResponder, MedicationResponder, ReportResponder, Responder,
    ResponderContext, ResponderError, ResponderRegistry, ResponderReply, SymptomResponder,
    TrackingResponder,
};
use locks::ConversationLocks;
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vitalis_config::VitalisConfig;
use vitalis_knowledge::{DocumentText, KnowledgeClient, KnowledgePayload, KnowledgeQuery};
use vitalis_memory::{
    MemorySummary, MemoryWindow, RecallOptions, SummaryStore, Summarizer, SummarizerOptions,
};
use vitalis_protocol::{
    ConversationId, DocumentId, ExtractedFact, FactKind, FinalReply, Intent, Role, TextEmbedder,
    TextGenerator, Turn, UserId, UserProfile,
};

/// Fixed decline for messages unrelated to health.
pub const OFF_TOPIC_REPLY: &str = "I'm a health assistant and can only help with health and \
medical questions. Ask me about your symptoms, medications, reports or logged health data.";

/// Retry prompt when a referenced document's text is not ready yet.
pub const MISSING_DOCUMENT_REPLY: &str = "I can't read that document yet: its text is still \
being extracted. Please try again in a moment.";

/// Last-resort reply when even the fallback responder fails.
const FALLBACK_REPLY: &str = "I'm having trouble answering right now. Your message was saved; \
please try asking again in a moment.";

/// One incoming message to process.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// User sending the message.
    pub user_id: UserId,
    /// Message text.
    pub text: String,
    /// Uploaded document the message refers to.
    pub document_ref: Option<DocumentId>,
    /// Medical profile assembled by the caller.
    pub profile: Option<UserProfile>,
}

/// Main orchestration façade: classifies, routes, extracts, persists
/// and maintains memory for each turn.
pub struct Orchestrator {
    config: Arc<VitalisConfig>,
    classifier: IntentClassifier,
    registry: ResponderRegistry,
    extractor: StructuredExtractor,
    embedder: Arc<dyn TextEmbedder>,
    knowledge: Arc<dyn KnowledgeClient>,
    history: Arc<dyn HistoryStore>,
    facts: Arc<dyn FactStore>,
    summaries: Arc<dyn SummaryStore>,
    summarizer: Arc<Summarizer>,
    locks: ConversationLocks,
    windows: Mutex<HashMap<ConversationId, MemoryWindow>>,
}

impl Orchestrator {
    /// Wire up the orchestrator with its capabilities and stores.
    pub fn new(
        config: VitalisConfig,
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn TextEmbedder>,
        knowledge: Arc<dyn KnowledgeClient>,
        history: Arc<dyn HistoryStore>,
        facts: Arc<dyn FactStore>,
        summaries: Arc<dyn SummaryStore>,
    ) -> Self {
        info!(
            "initializing orchestrator (window_size={}, summary_cadence={}, recall_k={})",
            config.memory.window_size, config.memory.summary_cadence, config.memory.recall_k
        );
        let classifier = IntentClassifier::new(
            generator.clone(),
            config.orchestrator.prompt_window_turns,
        );
        let mut registry = ResponderRegistry::new();
        registry.register(Arc::new(SymptomResponder::new(generator.clone())));
        registry.register(Arc::new(MedicationResponder::new(
            generator.clone(),
            knowledge.clone(),
        )));
        registry.register(Arc::new(ReportResponder::new(generator.clone())));
        registry.register(Arc::new(DiagnosisResponder::new(
            generator.clone(),
            knowledge.clone(),
            facts.clone(),
            config.knowledge.literature_max_results,
        )));
        registry.register(Arc::new(TrackingResponder::new(facts.clone())));
        registry.register(Arc::new(GeneralResponder::new(generator.clone())));

        let summarizer = Arc::new(Summarizer::new(
            generator,
            embedder.clone(),
            summaries.clone(),
            SummarizerOptions {
                max_chars: config.memory.summary_max_chars,
                max_attempts: config.memory.retry.max_attempts,
                base_delay: Duration::from_millis(config.memory.retry.base_delay_ms),
            },
        ));

        Self {
            config: Arc::new(config),
            classifier,
            registry,
            extractor: StructuredExtractor,
            embedder,
            knowledge,
            history,
            facts,
            summaries,
            summarizer,
            locks: ConversationLocks::new(),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Drive one conversational turn to completion.
    ///
    /// Exactly one user-presentable reply comes back, or the turn fails
    /// atomically on a persistence error. Intermediate failures
    /// (classification, responder, extraction, summarization) degrade
    /// in place.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<FinalReply, CoreError> {
        let TurnRequest {
            conversation_id,
            user_id,
            text,
            document_ref,
            profile,
        } = request;
        let _guard = self.locks.acquire(conversation_id).await;
        info!(
            "starting turn (conversation_id={}, text_len={})",
            conversation_id,
            text.len()
        );

        let window = self.window_snapshot(conversation_id)?;
        let intent = self
            .classifier
            .classify(&text, &window, document_ref.is_some())
            .await;
        info!(
            "routing decision (conversation_id={}, intent={intent})",
            conversation_id
        );

        let mut user_turn = Turn::new(conversation_id, Role::User, text.clone());
        if let Some(document_id) = document_ref {
            user_turn = user_turn.with_document(document_id);
        }

        if intent == Intent::OffTopic {
            // Terminal short-circuit: no extraction, no provider calls,
            // no persistence beyond recording the exchange.
            let assistant_turn = Turn::new(conversation_id, Role::Assistant, OFF_TOPIC_REPLY);
            self.commit_turns(conversation_id, &user_turn, &assistant_turn)?;
            return Ok(FinalReply {
                conversation_id,
                user_turn_id: user_turn.id,
                assistant_turn_id: assistant_turn.id,
                intent,
                text: OFF_TOPIC_REPLY.to_string(),
                facts: Vec::new(),
                safety_verdict: None,
                degraded: false,
            });
        }

        let summaries = self.recall_summaries(conversation_id, &text).await;
        let document_text = if intent == Intent::Report {
            self.fetch_document_text(document_ref).await
        } else {
            None
        };

        let ctx = ResponderContext {
            user_id,
            conversation_id,
            user_text: &text,
            window: &window,
            summaries: &summaries,
            document_text: document_text.as_deref(),
            profile: profile.as_ref(),
        };
        let responder = self
            .registry
            .get(intent)
            .ok_or(CoreError::UnknownResponder(intent))?;
        let (reply, degraded, extraction_applies) = match responder.respond(&ctx).await {
            Ok(reply) => (reply, false, true),
            Err(ResponderError::MissingDocument) => (
                ResponderReply::text_only(MISSING_DOCUMENT_REPLY),
                false,
                false,
            ),
            Err(err) => {
                warn!(
                    "responder failed, degrading to general (conversation_id={}, intent={intent}): {err}",
                    conversation_id
                );
                (self.fallback_reply(&ctx).await, true, true)
            }
        };

        let facts = if extraction_applies {
            self.extract_and_record(
                FactOrigin {
                    user_id,
                    conversation_id,
                    turn_id: user_turn.id,
                },
                &text,
                &reply,
                intent,
            )
        } else {
            Vec::new()
        };

        let assistant_turn = Turn::new(conversation_id, Role::Assistant, reply.text.clone());
        self.commit_turns(conversation_id, &user_turn, &assistant_turn)?;
        self.maybe_summarize(conversation_id).await;

        info!(
            "completed turn (conversation_id={}, intent={intent}, degraded={degraded}, facts={})",
            conversation_id,
            facts.len()
        );
        Ok(FinalReply {
            conversation_id,
            user_turn_id: user_turn.id,
            assistant_turn_id: assistant_turn.id,
            intent,
            text: reply.text,
            facts,
            safety_verdict: reply.safety_verdict,
            degraded,
        })
    }

    /// Dashboard accessor: fact counts by kind in a time window.
    pub fn fact_counts(
        &self,
        user_id: UserId,
        window: FactWindow,
    ) -> Result<HashMap<FactKind, usize>, CoreError> {
        self.facts
            .counts_by_kind(user_id, window)
            .map_err(|err| CoreError::Persistence(err.to_string()))
    }

    /// Dashboard accessor: facts recorded in a time window.
    pub fn facts_in_window(
        &self,
        user_id: UserId,
        window: FactWindow,
    ) -> Result<Vec<ExtractedFact>, CoreError> {
        self.facts
            .facts_in_window(user_id, window)
            .map_err(|err| CoreError::Persistence(err.to_string()))
    }

    /// Clone the cached window, rebuilding it from history on first use.
    fn window_snapshot(&self, conversation_id: ConversationId) -> Result<MemoryWindow, CoreError> {
        if let Some(window) = self.windows.lock().get(&conversation_id) {
            return Ok(window.clone());
        }
        let capacity = self.config.memory.window_size;
        let turns = self
            .history
            .load_recent(conversation_id, capacity)
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        let window = MemoryWindow::rebuild(capacity, turns);
        self.windows.lock().insert(conversation_id, window.clone());
        Ok(window)
    }

    /// Advisory long-term recall; failures resolve to no extra context.
    async fn recall_summaries(
        &self,
        conversation_id: ConversationId,
        text: &str,
    ) -> Vec<MemorySummary> {
        let embedding = match self.embedder.embed(text).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!("query embedding failed, skipping recall: {err}");
                return Vec::new();
            }
        };
        let options = RecallOptions {
            k: self.config.memory.recall_k,
            min_score: None,
        };
        match self
            .summaries
            .recall(conversation_id, &embedding, options)
            .await
        {
            Ok(summaries) => summaries,
            Err(err) => {
                warn!("summary recall failed, continuing without it: {err}");
                Vec::new()
            }
        }
    }

    /// Resolve the referenced document's extracted text, when ready.
    async fn fetch_document_text(&self, document_ref: Option<DocumentId>) -> Option<String> {
        let document_id = document_ref?;
        let result = self
            .knowledge
            .query(KnowledgeQuery::DocumentTextExtraction { document_id })
            .await;
        match result.payload() {
            Some(KnowledgePayload::DocumentText(DocumentText::Ready(text))) => Some(text.clone()),
            Some(KnowledgePayload::DocumentText(DocumentText::Pending)) => None,
            _ => {
                // An unavailable extractor reads the same as not-ready:
                // the user gets the retry prompt, not a hard error.
                None
            }
        }
    }

    /// Run the general responder as degradation target.
    async fn fallback_reply(&self, ctx: &ResponderContext<'_>) -> ResponderReply {
        if let Some(general) = self.registry.get(Intent::General) {
            match general.respond(ctx).await {
                Ok(reply) => return reply,
                Err(err) => warn!("fallback responder failed: {err}"),
            }
        }
        ResponderReply::text_only(FALLBACK_REPLY)
    }

    /// Best-effort extraction and persistence of structured facts.
    fn extract_and_record(
        &self,
        origin: FactOrigin,
        user_text: &str,
        reply: &ResponderReply,
        intent: Intent,
    ) -> Vec<ExtractedFact> {
        let scan_text = matches!(intent, Intent::Symptom | Intent::General);
        let facts = self
            .extractor
            .extract(origin, user_text, &reply.structured_hints, scan_text);
        if facts.is_empty() {
            return facts;
        }
        match self.facts.record_facts(&facts) {
            Ok(()) => facts,
            Err(err) => {
                warn!(
                    "fact persistence failed, reply proceeds without side-effects (conversation_id={}): {err}",
                    origin.conversation_id
                );
                Vec::new()
            }
        }
    }

    /// Append the turn pair and update the cached window.
    fn commit_turns(
        &self,
        conversation_id: ConversationId,
        user_turn: &Turn,
        assistant_turn: &Turn,
    ) -> Result<(), CoreError> {
        self.history
            .append_turns(
                conversation_id,
                &[user_turn.clone(), assistant_turn.clone()],
            )
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        let mut windows = self.windows.lock();
        let window = windows
            .entry(conversation_id)
            .or_insert_with(|| MemoryWindow::new(self.config.memory.window_size));
        window.push(user_turn.clone());
        window.push(assistant_turn.clone());
        Ok(())
    }

    /// Trigger detached summarization when the persisted turn count
    /// crossed a cadence boundary.
    async fn maybe_summarize(&self, conversation_id: ConversationId) {
        let cadence = self.config.memory.summary_cadence as u64;
        let count = match self.history.turn_count(conversation_id) {
            Ok(count) => count,
            Err(err) => {
                warn!("turn count unavailable, skipping summarization check: {err}");
                return;
            }
        };
        let before = count.saturating_sub(2);
        let boundary = (count / cadence) * cadence;
        if boundary == 0 || boundary <= before {
            return;
        }

        let last_covered = match self.summaries.last_covered_seq(conversation_id).await {
            Ok(seq) => seq,
            Err(err) => {
                warn!("summary archive unreadable, delaying summarization: {err}");
                return;
            }
        };
        if last_covered >= boundary {
            return;
        }
        // Snapshot at trigger time; turns are immutable and append-only
        // so the block cannot race a concurrent turn.
        let turns = match self.history.load_since(conversation_id, last_covered) {
            Ok(turns) => turns,
            Err(err) => {
                warn!("could not snapshot turns for summarization: {err}");
                return;
            }
        };
        let block_len = usize::try_from(boundary - last_covered).unwrap_or(usize::MAX);
        let block: Vec<Turn> = turns.into_iter().take(block_len).collect();
        if block.is_empty() {
            return;
        }
        info!(
            "triggering summarization (conversation_id={}, range={}..={})",
            conversation_id,
            last_covered + 1,
            boundary
        );
        let summarizer = self.summarizer.clone();
        tokio::spawn(async move {
            if let Err(err) = summarizer
                .summarize_block(conversation_id, &block, last_covered + 1, boundary)
                .await
            {
                warn!(
                    "detached summarization failed, turns remain intact (conversation_id={}): {err}",
                    conversation_id
                );
            }
        });
    }
}

//! Knowledge gateway stubs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use vitalis_knowledge::{
    KnowledgeClient, KnowledgePayload, KnowledgeQuery, KnowledgeQueryResult, ProviderKind,
};

/// Gateway stub answering from canned per-provider outcomes.
///
/// Providers without a canned payload answer `unavailable`.
#[derive(Clone, Default)]
pub struct StubKnowledge {
    payloads: Arc<Mutex<HashMap<ProviderKind, KnowledgePayload>>>,
}

impl StubKnowledge {
    /// Stub with every provider unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Register a canned payload for a provider.
    pub fn with_payload(self, provider: ProviderKind, payload: KnowledgePayload) -> Self {
        self.payloads.lock().insert(provider, payload);
        self
    }

    /// Replace a canned payload after construction.
    pub fn set_payload(&self, provider: ProviderKind, payload: KnowledgePayload) {
        self.payloads.lock().insert(provider, payload);
    }

    /// Remove a canned payload, making the provider unavailable again.
    pub fn clear_payload(&self, provider: ProviderKind) {
        self.payloads.lock().remove(&provider);
    }
}

#[async_trait]
impl KnowledgeClient for StubKnowledge {
    async fn query(&self, query: KnowledgeQuery) -> KnowledgeQueryResult {
        let provider = query.provider();
        match self.payloads.lock().get(&provider) {
            Some(payload) => KnowledgeQueryResult::available(provider, payload.clone()),
            None => KnowledgeQueryResult::unavailable(provider, "stubbed outage"),
        }
    }
}

/// Wrapper that counts queries per provider before delegating.
#[derive(Clone)]
pub struct RecordingKnowledge<C> {
    inner: C,
    calls: Arc<Mutex<Vec<ProviderKind>>>,
}

impl<C> RecordingKnowledge<C> {
    /// Wrap a client and return a handle to the recorded calls.
    pub fn new(inner: C) -> (Self, Arc<Mutex<Vec<ProviderKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl<C: KnowledgeClient> KnowledgeClient for RecordingKnowledge<C> {
    async fn query(&self, query: KnowledgeQuery) -> KnowledgeQueryResult {
        self.calls.lock().push(query.provider());
        self.inner.query(query).await
    }
}

//! Per-conversation single-writer serialization.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use vitalis_protocol::ConversationId;

/// Lock map keyed by conversation id.
///
/// Turns for the same conversation serialize on one async mutex held
/// for the whole pipeline; turns for different conversations proceed in
/// parallel.
#[derive(Default)]
pub(crate) struct ConversationLocks {
    inner: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a conversation, creating it on first use.
    pub(crate) async fn acquire(&self, conversation_id: ConversationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inner = self.inner.lock();
            inner
                .entry(conversation_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

//! Short-TTL cache for provider answers.

use crate::types::KnowledgeQueryResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    expires_at: Instant,
    result: KnowledgeQueryResult,
}

/// TTL cache keyed by (provider, normalized parameters).
///
/// Absorbs repeated queries within a session. Only available results are
/// inserted, so an outage is retried on the next call.
pub(crate) struct QueryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it when expired.
    pub(crate) fn get(&self, key: &str) -> Option<KnowledgeQueryResult> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a result under the configured TTL.
    pub(crate) fn insert(&self, key: String, result: KnowledgeQueryResult) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                expires_at: Instant::now() + self.ttl,
                result,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::QueryCache;
    use crate::types::{KnowledgePayload, KnowledgeQueryResult, ProviderKind};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn result() -> KnowledgeQueryResult {
        KnowledgeQueryResult::available(
            ProviderKind::DrugInteractions,
            KnowledgePayload::Interactions {
                text: "none known".to_string(),
            },
        )
    }

    #[test]
    fn get_returns_live_entries() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.insert("key".to_string(), result());
        assert_eq!(cache.get("key"), Some(result()));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = QueryCache::new(Duration::from_millis(0));
        cache.insert("key".to_string(), result());
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("key"), None);
    }
}

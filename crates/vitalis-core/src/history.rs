//! Turn-history persistence using JSONL rollouts.
//!
//! Turns are append-only and id-keyed: replaying an append with a turn
//! id that is already on disk is a no-op, and the user/assistant pair of
//! one conversational turn is written in a single append so no partial
//! turn ever becomes visible.

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;
use vitalis_protocol::{ConversationId, Turn};

/// Errors returned by the history store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistent store abstraction for conversation turns.
pub trait HistoryStore: Send + Sync {
    /// Append turns atomically, skipping ids already persisted.
    fn append_turns(
        &self,
        conversation_id: ConversationId,
        turns: &[Turn],
    ) -> Result<(), StateError>;

    /// Load the most recent `n` turns in chronological order.
    fn load_recent(&self, conversation_id: ConversationId, n: usize)
    -> Result<Vec<Turn>, StateError>;

    /// Load turns with 1-based sequence numbers greater than `after_seq`.
    fn load_since(
        &self,
        conversation_id: ConversationId,
        after_seq: u64,
    ) -> Result<Vec<Turn>, StateError>;

    /// Total persisted turn count for a conversation.
    fn turn_count(&self, conversation_id: ConversationId) -> Result<u64, StateError>;
}

/// Cached per-conversation index of persisted turn ids.
#[derive(Default)]
struct ConversationIndex {
    ids: HashSet<Uuid>,
    count: u64,
}

/// JSONL-backed history store, one file per conversation.
pub struct JsonlHistoryStore {
    root: PathBuf,
    index: Mutex<HashMap<ConversationId, ConversationIndex>>,
}

impl JsonlHistoryStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StateError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized history store (root={})", root.display());
        Ok(Self {
            root,
            index: Mutex::new(HashMap::new()),
        })
    }

    /// Path to the conversation JSONL file.
    fn conversation_path(&self, conversation_id: ConversationId) -> PathBuf {
        self.root.join(format!("{conversation_id}.jsonl"))
    }

    /// Load all turns for a conversation in persisted order.
    fn load_turns(&self, conversation_id: ConversationId) -> Result<Vec<Turn>, StateError> {
        let path = self.conversation_path(conversation_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut turns = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let turn: Turn = serde_json::from_str(&line)?;
            turns.push(turn);
        }
        Ok(turns)
    }

    /// Run a closure against the (lazily built) index for a conversation.
    fn with_index<T>(
        &self,
        conversation_id: ConversationId,
        f: impl FnOnce(&mut ConversationIndex) -> T,
    ) -> Result<T, StateError> {
        let mut index = self.index.lock();
        if !index.contains_key(&conversation_id) {
            let turns = self.load_turns(conversation_id)?;
            let entry = ConversationIndex {
                ids: turns.iter().map(|turn| turn.id).collect(),
                count: turns.len() as u64,
            };
            index.insert(conversation_id, entry);
        }
        let entry = index
            .entry(conversation_id)
            .or_insert_with(ConversationIndex::default);
        Ok(f(entry))
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append_turns(
        &self,
        conversation_id: ConversationId,
        turns: &[Turn],
    ) -> Result<(), StateError> {
        // Serialize the fresh turns into one buffer first so the pair
        // lands in a single write.
        let mut buffer = String::new();
        let fresh: Vec<&Turn> = self.with_index(conversation_id, |entry| {
            turns
                .iter()
                .filter(|turn| !entry.ids.contains(&turn.id))
                .collect()
        })?;
        if fresh.is_empty() {
            debug!(
                "append skipped, all turns already persisted (conversation_id={})",
                conversation_id
            );
            return Ok(());
        }
        for turn in &fresh {
            buffer.push_str(&serde_json::to_string(turn)?);
            buffer.push('\n');
        }

        let path = self.conversation_path(conversation_id);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(buffer.as_bytes())?;
        file.flush()?;

        self.with_index(conversation_id, |entry| {
            for turn in &fresh {
                entry.ids.insert(turn.id);
            }
            entry.count += fresh.len() as u64;
        })?;
        debug!(
            "appended turns (conversation_id={}, appended={})",
            conversation_id,
            fresh.len()
        );
        Ok(())
    }

    fn load_recent(
        &self,
        conversation_id: ConversationId,
        n: usize,
    ) -> Result<Vec<Turn>, StateError> {
        let turns = self.load_turns(conversation_id)?;
        let start = turns.len().saturating_sub(n);
        Ok(turns[start..].to_vec())
    }

    fn load_since(
        &self,
        conversation_id: ConversationId,
        after_seq: u64,
    ) -> Result<Vec<Turn>, StateError> {
        let turns = self.load_turns(conversation_id)?;
        let skip = usize::try_from(after_seq).unwrap_or(usize::MAX).min(turns.len());
        Ok(turns[skip..].to_vec())
    }

    fn turn_count(&self, conversation_id: ConversationId) -> Result<u64, StateError> {
        self.with_index(conversation_id, |entry| entry.count)
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryStore, JsonlHistoryStore};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use uuid::Uuid;
    use vitalis_protocol::{Role, Turn};

    fn pair(conversation_id: Uuid, user: &str, assistant: &str) -> Vec<Turn> {
        vec![
            Turn::new(conversation_id, Role::User, user),
            Turn::new(conversation_id, Role::Assistant, assistant),
        ]
    }

    #[test]
    fn append_and_load_preserves_order() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();

        store
            .append_turns(conversation_id, &pair(conversation_id, "one", "two"))
            .expect("append");
        store
            .append_turns(conversation_id, &pair(conversation_id, "three", "four"))
            .expect("append");

        let texts: Vec<String> = store
            .load_recent(conversation_id, 10)
            .expect("load")
            .into_iter()
            .map(|turn| turn.text)
            .collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
        assert_eq!(store.turn_count(conversation_id).expect("count"), 4);
    }

    #[test]
    fn replaying_an_append_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();
        let turns = pair(conversation_id, "hello", "hi");

        store.append_turns(conversation_id, &turns).expect("append");
        store.append_turns(conversation_id, &turns).expect("replay");

        assert_eq!(store.turn_count(conversation_id).expect("count"), 2);
        assert_eq!(store.load_recent(conversation_id, 10).expect("load").len(), 2);
    }

    #[test]
    fn idempotency_survives_a_fresh_store_instance() {
        let temp = tempdir().expect("tempdir");
        let conversation_id = Uuid::new_v4();
        let turns = pair(conversation_id, "hello", "hi");

        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        store.append_turns(conversation_id, &turns).expect("append");
        drop(store);

        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        store.append_turns(conversation_id, &turns).expect("replay");
        assert_eq!(store.turn_count(conversation_id).expect("count"), 2);
    }

    #[test]
    fn load_recent_returns_newest_suffix() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();
        store
            .append_turns(conversation_id, &pair(conversation_id, "a", "b"))
            .expect("append");
        store
            .append_turns(conversation_id, &pair(conversation_id, "c", "d"))
            .expect("append");

        let recent = store.load_recent(conversation_id, 1).expect("load");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].text, "d");
    }

    #[test]
    fn load_since_skips_covered_turns() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();
        store
            .append_turns(conversation_id, &pair(conversation_id, "a", "b"))
            .expect("append");
        store
            .append_turns(conversation_id, &pair(conversation_id, "c", "d"))
            .expect("append");

        let since = store.load_since(conversation_id, 2).expect("load");
        let texts: Vec<String> = since.into_iter().map(|turn| turn.text).collect();
        assert_eq!(texts, vec!["c", "d"]);
    }

    #[test]
    fn empty_conversation_reads_cleanly() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlHistoryStore::new(temp.path()).expect("store");
        let conversation_id = Uuid::new_v4();
        assert_eq!(store.load_recent(conversation_id, 5).expect("load").len(), 0);
        assert_eq!(store.turn_count(conversation_id).expect("count"), 0);
    }
}

//! Persistence and aggregation for extracted health facts.

use crate::history::StateError;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vitalis_protocol::{ExtractedFact, FactKind, UserId};

/// Time window for fact queries, ending at `until`.
#[derive(Debug, Clone, Copy)]
pub struct FactWindow {
    pub since: chrono::DateTime<chrono::Utc>,
    pub until: chrono::DateTime<chrono::Utc>,
}

/// Persistent store abstraction for extracted facts.
///
/// Facts are append-only and id-keyed; corrections arrive as new facts.
pub trait FactStore: Send + Sync {
    /// Record facts, skipping ids already persisted.
    fn record_facts(&self, facts: &[ExtractedFact]) -> Result<(), StateError>;

    /// All facts for a user in recording order.
    fn list_for_user(&self, user_id: UserId) -> Result<Vec<ExtractedFact>, StateError>;

    /// Facts recorded within a time window.
    fn facts_in_window(
        &self,
        user_id: UserId,
        window: FactWindow,
    ) -> Result<Vec<ExtractedFact>, StateError> {
        let facts = self.list_for_user(user_id)?;
        Ok(facts
            .into_iter()
            .filter(|fact| fact.recorded_at >= window.since && fact.recorded_at <= window.until)
            .collect())
    }

    /// Dashboard aggregation: fact counts by kind within a window.
    fn counts_by_kind(
        &self,
        user_id: UserId,
        window: FactWindow,
    ) -> Result<HashMap<FactKind, usize>, StateError> {
        let mut counts = HashMap::new();
        for fact in self.facts_in_window(user_id, window)? {
            *counts.entry(fact.payload.kind()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// JSONL-backed fact store, one file per user.
pub struct JsonlFactStore {
    root: PathBuf,
    index: Mutex<HashMap<UserId, HashSet<Uuid>>>,
}

impl JsonlFactStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StateError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized fact store (root={})", root.display());
        Ok(Self {
            root,
            index: Mutex::new(HashMap::new()),
        })
    }

    fn user_path(&self, user_id: UserId) -> PathBuf {
        self.root.join(format!("{user_id}.jsonl"))
    }

    fn load_facts(&self, user_id: UserId) -> Result<Vec<ExtractedFact>, StateError> {
        let path = self.user_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut facts = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fact: ExtractedFact = serde_json::from_str(&line)?;
            facts.push(fact);
        }
        Ok(facts)
    }

    /// Ids already persisted for a user, loading the file on first use.
    fn known_ids(&self, user_id: UserId) -> Result<HashSet<Uuid>, StateError> {
        {
            let index = self.index.lock();
            if let Some(ids) = index.get(&user_id) {
                return Ok(ids.clone());
            }
        }
        let ids: HashSet<Uuid> = self.load_facts(user_id)?.iter().map(|fact| fact.id).collect();
        self.index.lock().insert(user_id, ids.clone());
        Ok(ids)
    }
}

impl FactStore for JsonlFactStore {
    fn record_facts(&self, facts: &[ExtractedFact]) -> Result<(), StateError> {
        let mut by_user: HashMap<UserId, Vec<&ExtractedFact>> = HashMap::new();
        for fact in facts {
            by_user.entry(fact.user_id).or_default().push(fact);
        }
        for (user_id, user_facts) in by_user {
            let known = self.known_ids(user_id)?;
            let fresh: Vec<&&ExtractedFact> = user_facts
                .iter()
                .filter(|fact| !known.contains(&fact.id))
                .collect();
            if fresh.is_empty() {
                continue;
            }
            let mut buffer = String::new();
            for fact in &fresh {
                buffer.push_str(&serde_json::to_string(**fact)?);
                buffer.push('\n');
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.user_path(user_id))?;
            file.write_all(buffer.as_bytes())?;
            file.flush()?;

            let mut index = self.index.lock();
            let ids = index.entry(user_id).or_default();
            for fact in &fresh {
                ids.insert(fact.id);
            }
            debug!(
                "recorded facts (user_id={}, recorded={})",
                user_id,
                fresh.len()
            );
        }
        Ok(())
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<ExtractedFact>, StateError> {
        self.load_facts(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{FactStore, FactWindow, JsonlFactStore};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use uuid::Uuid;
    use vitalis_protocol::{ExtractedFact, FactKind, FactPayload};

    fn symptom_fact(user_id: Uuid, name: &str) -> ExtractedFact {
        ExtractedFact::new(
            user_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FactPayload::Symptom {
                name: name.to_string(),
                severity: None,
                duration: None,
            },
        )
    }

    fn full_window() -> FactWindow {
        FactWindow {
            since: Utc::now() - Duration::days(1),
            until: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn record_and_list_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlFactStore::new(temp.path()).expect("store");
        let user_id = Uuid::new_v4();

        let facts = vec![symptom_fact(user_id, "headache"), symptom_fact(user_id, "fever")];
        store.record_facts(&facts).expect("record");

        let listed = store.list_for_user(user_id).expect("list");
        assert_eq!(listed, facts);
    }

    #[test]
    fn replaying_record_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlFactStore::new(temp.path()).expect("store");
        let user_id = Uuid::new_v4();
        let facts = vec![symptom_fact(user_id, "nausea")];

        store.record_facts(&facts).expect("record");
        store.record_facts(&facts).expect("replay");
        assert_eq!(store.list_for_user(user_id).expect("list").len(), 1);
    }

    #[test]
    fn counts_by_kind_respects_window() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlFactStore::new(temp.path()).expect("store");
        let user_id = Uuid::new_v4();

        let mut old_fact = symptom_fact(user_id, "cough");
        old_fact.recorded_at = Utc::now() - Duration::days(30);
        let vital = ExtractedFact::new(
            user_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FactPayload::VitalSign {
                vital: vitalis_protocol::VitalKind::HeartRate,
                value: 72.0,
                unit: "bpm".to_string(),
            },
        );
        store
            .record_facts(&[old_fact, symptom_fact(user_id, "fever"), vital])
            .expect("record");

        let counts = store.counts_by_kind(user_id, full_window()).expect("counts");
        assert_eq!(counts.get(&FactKind::Symptom), Some(&1));
        assert_eq!(counts.get(&FactKind::VitalSign), Some(&1));
        assert_eq!(counts.get(&FactKind::Medication), None);
    }
}

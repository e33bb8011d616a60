//! Tracking read-path and dashboard aggregation tests.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;
use uuid::Uuid;
use vitalis_config::VitalisConfig;
use vitalis_core::{
    FactStore, FactWindow, JsonlFactStore, JsonlHistoryStore, Orchestrator, TurnRequest,
};
use vitalis_memory::FileSummaryStore;
use vitalis_protocol::{ExtractedFact, FactKind, FactPayload, Intent, VitalKind};
use vitalis_test_utils::{FixedGenerator, RecordingKnowledge, StubEmbedder, StubKnowledge};

fn seed_facts(store: &JsonlFactStore, user_id: Uuid) {
    let symptom = ExtractedFact::new(
        user_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        FactPayload::Symptom {
            name: "headache".to_string(),
            severity: None,
            duration: Some("2 days".to_string()),
        },
    );
    let vital = ExtractedFact::new(
        user_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        FactPayload::VitalSign {
            vital: VitalKind::BloodPressure,
            value: 128.0,
            unit: "mmHg".to_string(),
        },
    );
    store.record_facts(&[symptom, vital]).expect("seed facts");
}

#[tokio::test]
async fn tracking_turn_reads_persisted_facts_without_providers() {
    let temp = tempdir().expect("tempdir");
    let history =
        Arc::new(JsonlHistoryStore::new(temp.path().join("history")).expect("history store"));
    let facts = Arc::new(JsonlFactStore::new(temp.path().join("facts")).expect("fact store"));
    let summaries =
        Arc::new(FileSummaryStore::new(temp.path().join("summaries")).expect("summary store"));
    let (knowledge, knowledge_calls) = RecordingKnowledge::new(StubKnowledge::unavailable());

    let user_id = Uuid::new_v4();
    seed_facts(&facts, user_id);

    let orchestrator = Orchestrator::new(
        VitalisConfig::default(),
        Arc::new(FixedGenerator::new("tracking")),
        Arc::new(StubEmbedder::new(8)),
        Arc::new(knowledge),
        history,
        facts.clone(),
        summaries,
    );

    let reply = orchestrator
        .handle_turn(TurnRequest {
            conversation_id: Uuid::new_v4(),
            user_id,
            text: "show me what I logged this week".to_string(),
            document_ref: None,
            profile: None,
        })
        .await
        .expect("turn");

    assert_eq!(reply.intent, Intent::Tracking);
    assert_eq!(reply.degraded, false);
    assert!(reply.text.contains("headache"));
    assert!(reply.text.contains("BloodPressure 128 mmHg"));
    // Pure read path: no external providers were consulted.
    assert_eq!(knowledge_calls.lock().len(), 0);
    // The tracking turn itself records no new facts.
    assert_eq!(facts.list_for_user(user_id).expect("list").len(), 2);
}

#[tokio::test]
async fn dashboard_counts_aggregate_by_kind_and_window() {
    let temp = tempdir().expect("tempdir");
    let history =
        Arc::new(JsonlHistoryStore::new(temp.path().join("history")).expect("history store"));
    let facts = Arc::new(JsonlFactStore::new(temp.path().join("facts")).expect("fact store"));
    let summaries =
        Arc::new(FileSummaryStore::new(temp.path().join("summaries")).expect("summary store"));

    let user_id = Uuid::new_v4();
    seed_facts(&facts, user_id);
    let mut stale = ExtractedFact::new(
        user_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        FactPayload::Medication {
            name: "metformin".to_string(),
            dose: None,
            frequency: None,
        },
    );
    stale.recorded_at = Utc::now() - Duration::days(90);
    facts.record_facts(&[stale]).expect("record");

    let orchestrator = Orchestrator::new(
        VitalisConfig::default(),
        Arc::new(FixedGenerator::new("tracking")),
        Arc::new(StubEmbedder::new(8)),
        Arc::new(StubKnowledge::unavailable()),
        history,
        facts,
        summaries,
    );

    let window = FactWindow {
        since: Utc::now() - Duration::days(7),
        until: Utc::now(),
    };
    let counts = orchestrator.fact_counts(user_id, window).expect("counts");
    assert_eq!(counts.get(&FactKind::Symptom), Some(&1));
    assert_eq!(counts.get(&FactKind::VitalSign), Some(&1));
    assert_eq!(counts.get(&FactKind::Medication), None);

    let listed = orchestrator.facts_in_window(user_id, window).expect("facts");
    assert_eq!(listed.len(), 2);
}

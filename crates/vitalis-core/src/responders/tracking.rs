//! Tracking responder: pure read path over persisted facts.

use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use crate::facts::{FactStore, FactWindow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use vitalis_protocol::{FactPayload, Intent};

static LAST_N_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:last|past)\s+(\d+)\s+days?\b").unwrap());

/// Handles "show me my data" turns. Reads previously persisted facts
/// only; no generator, no external providers.
pub struct TrackingResponder {
    facts: Arc<dyn FactStore>,
}

impl TrackingResponder {
    pub fn new(facts: Arc<dyn FactStore>) -> Self {
        Self { facts }
    }
}

#[async_trait]
impl Responder for TrackingResponder {
    fn intent(&self) -> Intent {
        Intent::Tracking
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        let now = Utc::now();
        let (window, label) = parse_time_window(ctx.user_text, now);
        debug!(
            "tracking responder running (user_id={}, range={label})",
            ctx.user_id
        );
        let facts = self
            .facts
            .facts_in_window(ctx.user_id, window)
            .map_err(|err| ResponderError::Store(err.to_string()))?;

        if facts.is_empty() {
            return Ok(ResponderReply::text_only(format!(
                "You have no logged health data for {label}. Mention symptoms, measurements or \
                 medications in our chats and I will record them for you."
            )));
        }

        let mut symptoms = Vec::new();
        let mut vitals = Vec::new();
        let mut medications = Vec::new();
        for fact in &facts {
            let date = fact.recorded_at.format("%Y-%m-%d");
            match &fact.payload {
                FactPayload::Symptom {
                    name,
                    severity,
                    duration,
                } => {
                    let mut line = format!("- {date}: {name}");
                    if let Some(severity) = severity {
                        line.push_str(&format!(" ({severity:?})").to_lowercase());
                    }
                    if let Some(duration) = duration {
                        line.push_str(&format!(", lasting {duration}"));
                    }
                    symptoms.push(line);
                }
                FactPayload::VitalSign { vital, value, unit } => {
                    vitals.push(format!("- {date}: {vital:?} {value} {unit}"));
                }
                FactPayload::Medication {
                    name,
                    dose,
                    frequency,
                } => {
                    let mut line = format!("- {date}: {name}");
                    if let Some(dose) = dose {
                        line.push_str(&format!(" {dose}"));
                    }
                    if let Some(frequency) = frequency {
                        line.push_str(&format!(", {frequency}"));
                    }
                    medications.push(line);
                }
            }
        }

        let mut sections = vec![format!("Here is what you logged for {label}:")];
        if !symptoms.is_empty() {
            sections.push(format!("Symptoms:\n{}", symptoms.join("\n")));
        }
        if !vitals.is_empty() {
            sections.push(format!("Vital signs:\n{}", vitals.join("\n")));
        }
        if !medications.is_empty() {
            sections.push(format!("Medications:\n{}", medications.join("\n")));
        }
        Ok(ResponderReply::text_only(sections.join("\n\n")))
    }
}

/// Resolve a natural-language range to a window ending now.
fn parse_time_window(text: &str, now: DateTime<Utc>) -> (FactWindow, String) {
    let lowered = text.to_lowercase();
    let (since, label) = if let Some(caps) = LAST_N_DAYS_RE.captures(&lowered) {
        let days: i64 = caps[1].parse().unwrap_or(7);
        (now - Duration::days(days), format!("the last {days} days"))
    } else if lowered.contains("today") {
        (now - Duration::hours(24), "today".to_string())
    } else if lowered.contains("this week") || lowered.contains("week") {
        (now - Duration::days(7), "this week".to_string())
    } else if lowered.contains("this month") || lowered.contains("month") {
        (now - Duration::days(30), "this month".to_string())
    } else {
        (now - Duration::days(7), "the last 7 days".to_string())
    };
    (FactWindow { since, until: now }, label)
}

#[cfg(test)]
mod tests {
    use super::{TrackingResponder, parse_time_window};
    use crate::facts::{FactStore, JsonlFactStore};
    use crate::responders::{Responder, ResponderContext};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;
    use uuid::Uuid;
    use vitalis_memory::MemoryWindow;
    use vitalis_protocol::{ExtractedFact, FactPayload, VitalKind};

    #[test]
    fn parses_natural_language_ranges() {
        let now = Utc::now();
        let (window, label) = parse_time_window("show me this week", now);
        assert_eq!(label, "this week");
        assert_eq!((now - window.since).num_days(), 7);

        let (window, label) = parse_time_window("what did I log in the last 3 days", now);
        assert_eq!(label, "the last 3 days");
        assert_eq!((now - window.since).num_days(), 3);

        let (_, label) = parse_time_window("show my data", now);
        assert_eq!(label, "the last 7 days");
    }

    #[tokio::test]
    async fn lists_recent_facts_grouped_by_kind() {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(JsonlFactStore::new(temp.path()).expect("store"));
        let user_id = Uuid::new_v4();

        let mut old = ExtractedFact::new(
            user_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FactPayload::Symptom {
                name: "cough".to_string(),
                severity: None,
                duration: None,
            },
        );
        old.recorded_at = Utc::now() - Duration::days(20);
        let fresh = ExtractedFact::new(
            user_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FactPayload::VitalSign {
                vital: VitalKind::HeartRate,
                value: 70.0,
                unit: "bpm".to_string(),
            },
        );
        store.record_facts(&[old, fresh]).expect("record");

        let responder = TrackingResponder::new(store);
        let window = MemoryWindow::new(4);
        let ctx = ResponderContext {
            user_id,
            conversation_id: Uuid::new_v4(),
            user_text: "show me my vitals for this week",
            window: &window,
            summaries: &[],
            document_text: None,
            profile: None,
        };
        let reply = responder.respond(&ctx).await.expect("respond");
        assert!(reply.text.contains("HeartRate 70 bpm"));
        assert!(!reply.text.contains("cough"));
    }

    #[tokio::test]
    async fn empty_history_gets_a_friendly_answer() {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(JsonlFactStore::new(temp.path()).expect("store"));
        let responder = TrackingResponder::new(store);
        let window = MemoryWindow::new(4);
        let ctx = ResponderContext {
            user_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_text: "show my data for today",
            window: &window,
            summaries: &[],
            document_text: None,
            profile: None,
        };
        let reply = responder.respond(&ctx).await.expect("respond");
        assert!(reply.text.contains("no logged health data"));
    }
}

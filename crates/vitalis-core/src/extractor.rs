//! Structured fact extraction from responder output and user text.
//!
//! Extraction is best-effort: malformed hints are logged and skipped,
//! and nothing here can fail a turn.

use log::{debug, warn};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use vitalis_protocol::{
    ConversationId, ExtractedFact, FactPayload, Severity, TurnId, UserId, VitalKind,
};

/// Symptom vocabulary scanned in user text.
const SYMPTOM_TERMS: &[&str] = &[
    "headache",
    "migraine",
    "fever",
    "cough",
    "nausea",
    "vomiting",
    "dizziness",
    "fatigue",
    "chills",
    "rash",
    "sore throat",
    "chest pain",
    "back pain",
    "shortness of breath",
    "diarrhea",
    "constipation",
    "insomnia",
    "palpitations",
    "cramps",
];

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(?:the\s+(?:past|last)\s+)?(\d+)\s+(hour|hours|day|days|week|weeks|month|months)\b")
        .unwrap()
});

static BLOOD_PRESSURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:blood pressure|\bbp\b)(?:\s+(?:is|was|of|reading))?\s*:?\s*(\d{2,3})\s*/\s*(\d{2,3})")
        .unwrap()
});

static HEART_RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:heart rate|pulse)(?:\s+(?:is|was|of))?\s*:?\s*(\d{2,3})").unwrap()
});

static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:weigh|weight(?:\s+is)?)\s*:?\s*(\d{2,3}(?:\.\d+)?)\s*(kg|kilograms|lbs|pounds)")
        .unwrap()
});

static TEMPERATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:temperature|temp)\b(?:\s+(?:is|was|of))?\s*:?\s*(\d{2,3}(?:\.\d+)?)")
        .unwrap()
});

/// Location a fact is attributed to.
#[derive(Debug, Clone, Copy)]
pub struct FactOrigin {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub turn_id: TurnId,
}

/// Turns responder hints and raw user text into typed facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredExtractor;

impl StructuredExtractor {
    /// Extract facts from structured hints plus, when `scan_text` is
    /// set, a deterministic scan of the user text.
    pub fn extract(
        &self,
        origin: FactOrigin,
        user_text: &str,
        hints: &Value,
        scan_text: bool,
    ) -> Vec<ExtractedFact> {
        let mut payloads = Vec::new();
        payloads.extend(payloads_from_hints(hints));
        if scan_text {
            payloads.extend(payloads_from_text(user_text));
        }
        dedup(&mut payloads);
        debug!(
            "extracted facts (conversation_id={}, count={})",
            origin.conversation_id,
            payloads.len()
        );
        payloads
            .into_iter()
            .map(|payload| {
                ExtractedFact::new(origin.user_id, origin.conversation_id, origin.turn_id, payload)
            })
            .collect()
    }
}

/// Parse the responder hint object (`symptoms`, `vital_signs`,
/// `medications` arrays).
fn payloads_from_hints(hints: &Value) -> Vec<FactPayload> {
    let mut payloads = Vec::new();
    if let Some(symptoms) = hints.get("symptoms").and_then(Value::as_array) {
        for entry in symptoms {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                warn!("skipping symptom hint without name");
                continue;
            };
            payloads.push(FactPayload::Symptom {
                name: name.to_lowercase(),
                severity: entry
                    .get("severity")
                    .and_then(Value::as_str)
                    .and_then(Severity::parse),
                duration: entry
                    .get("duration")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
    }
    if let Some(vitals) = hints.get("vital_signs").and_then(Value::as_array) {
        for entry in vitals {
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .and_then(parse_vital_kind);
            let value = entry.get("value").and_then(Value::as_f64);
            let (Some(kind), Some(value)) = (kind, value) else {
                warn!("skipping vital-sign hint with missing type or value");
                continue;
            };
            payloads.push(FactPayload::VitalSign {
                vital: kind,
                value,
                unit: entry
                    .get("unit")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            });
        }
    }
    if let Some(medications) = hints.get("medications").and_then(Value::as_array) {
        for entry in medications {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                warn!("skipping medication hint without name");
                continue;
            };
            payloads.push(FactPayload::Medication {
                name: name.to_lowercase(),
                dose: entry
                    .get("dose")
                    .or_else(|| entry.get("dosage"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                frequency: entry
                    .get("frequency")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
    }
    payloads
}

/// Symptom vocabulary terms occurring in a text.
pub fn symptom_terms_in(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    SYMPTOM_TERMS
        .iter()
        .copied()
        .filter(|term| lowered.contains(term))
        .collect()
}

/// Deterministic lexicon and pattern scan over the raw user text.
fn payloads_from_text(text: &str) -> Vec<FactPayload> {
    let lowered = text.to_lowercase();
    let duration = DURATION_RE
        .captures(text)
        .map(|caps| format!("{} {}", &caps[1], caps[2].to_lowercase()));
    let severity = severity_from_text(&lowered);

    let mut payloads = Vec::new();
    for term in symptom_terms_in(text) {
        payloads.push(FactPayload::Symptom {
            name: term.to_string(),
            severity,
            duration: duration.clone(),
        });
    }
    if let Some(caps) = BLOOD_PRESSURE_RE.captures(text)
        && let Ok(systolic) = caps[1].parse::<f64>()
    {
        payloads.push(FactPayload::VitalSign {
            vital: VitalKind::BloodPressure,
            value: systolic,
            unit: "mmHg".to_string(),
        });
    }
    if let Some(caps) = HEART_RATE_RE.captures(text)
        && let Ok(value) = caps[1].parse::<f64>()
    {
        payloads.push(FactPayload::VitalSign {
            vital: VitalKind::HeartRate,
            value,
            unit: "bpm".to_string(),
        });
    }
    if let Some(caps) = WEIGHT_RE.captures(text)
        && let Ok(value) = caps[1].parse::<f64>()
    {
        let unit = match caps[2].to_lowercase().as_str() {
            "kg" | "kilograms" => "kg",
            _ => "lbs",
        };
        payloads.push(FactPayload::VitalSign {
            vital: VitalKind::Weight,
            value,
            unit: unit.to_string(),
        });
    }
    if let Some(caps) = TEMPERATURE_RE.captures(text)
        && let Ok(value) = caps[1].parse::<f64>()
    {
        // Plausible human temperatures only; larger readings are noise.
        if (30.0..=115.0).contains(&value) {
            let unit = if value > 45.0 { "°F" } else { "°C" };
            payloads.push(FactPayload::VitalSign {
                vital: VitalKind::Temperature,
                value,
                unit: unit.to_string(),
            });
        }
    }
    payloads
}

fn severity_from_text(lowered: &str) -> Option<Severity> {
    if lowered.contains("critical") || lowered.contains("unbearable") {
        Some(Severity::Critical)
    } else if lowered.contains("severe") {
        Some(Severity::Severe)
    } else if lowered.contains("moderate") {
        Some(Severity::Moderate)
    } else if lowered.contains("mild") || lowered.contains("slight") {
        Some(Severity::Mild)
    } else {
        None
    }
}

fn parse_vital_kind(value: &str) -> Option<VitalKind> {
    match value.trim().to_lowercase().as_str() {
        "blood_pressure" | "blood pressure" => Some(VitalKind::BloodPressure),
        "heart_rate" | "heart rate" | "pulse" => Some(VitalKind::HeartRate),
        "temperature" => Some(VitalKind::Temperature),
        "weight" => Some(VitalKind::Weight),
        "blood_glucose" | "blood sugar" | "glucose" => Some(VitalKind::BloodGlucose),
        "oxygen_saturation" | "spo2" => Some(VitalKind::OxygenSaturation),
        "respiratory_rate" => Some(VitalKind::RespiratoryRate),
        _ => None,
    }
}

/// Drop duplicate payloads, keeping first occurrence.
fn dedup(payloads: &mut Vec<FactPayload>) {
    let mut seen = std::collections::HashSet::new();
    payloads.retain(|payload| {
        let key = match payload {
            FactPayload::Symptom { name, .. } => format!("symptom:{name}"),
            FactPayload::VitalSign { vital, .. } => format!("vital:{vital:?}"),
            FactPayload::Medication { name, .. } => format!("medication:{name}"),
        };
        seen.insert(key)
    });
}

#[cfg(test)]
mod tests {
    use super::{FactOrigin, StructuredExtractor};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;
    use vitalis_protocol::{FactPayload, Severity, VitalKind};

    fn origin() -> FactOrigin {
        FactOrigin {
            user_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            turn_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn scans_symptoms_with_shared_duration() {
        let facts = StructuredExtractor.extract(
            origin(),
            "I have a headache and fever for 2 days",
            &json!({}),
            true,
        );
        let payloads: Vec<&FactPayload> = facts.iter().map(|fact| &fact.payload).collect();
        assert_eq!(payloads.len(), 2);
        match payloads[0] {
            FactPayload::Symptom { name, duration, .. } => {
                assert_eq!(name, "headache");
                assert_eq!(duration.as_deref(), Some("2 days"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        match payloads[1] {
            FactPayload::Symptom { name, duration, .. } => {
                assert_eq!(name, "fever");
                assert_eq!(duration.as_deref(), Some("2 days"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn scans_severity_words() {
        let facts =
            StructuredExtractor.extract(origin(), "severe migraine since yesterday", &json!({}), true);
        match &facts[0].payload {
            FactPayload::Symptom { severity, .. } => {
                assert_eq!(*severity, Some(Severity::Severe));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn scans_vital_sign_patterns() {
        let facts = StructuredExtractor.extract(
            origin(),
            "my blood pressure was 138/85 and my pulse is 92",
            &json!({}),
            true,
        );
        assert_eq!(facts.len(), 2);
        match &facts[0].payload {
            FactPayload::VitalSign { vital, value, unit } => {
                assert_eq!(*vital, VitalKind::BloodPressure);
                assert_eq!(*value, 138.0);
                assert_eq!(unit, "mmHg");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        match &facts[1].payload {
            FactPayload::VitalSign { vital, value, .. } => {
                assert_eq!(*vital, VitalKind::HeartRate);
                assert_eq!(*value, 92.0);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn merges_hints_and_deduplicates_text_matches() {
        let hints = json!({
            "symptoms": [{ "name": "Headache", "severity": "moderate", "duration": "2 days" }],
            "medications": [{ "name": "Aspirin", "dosage": "100mg", "frequency": "daily" }]
        });
        let facts =
            StructuredExtractor.extract(origin(), "I have a headache for 2 days", &hints, true);
        assert_eq!(facts.len(), 2);
        match &facts[0].payload {
            FactPayload::Symptom { name, severity, .. } => {
                assert_eq!(name, "headache");
                assert_eq!(*severity, Some(Severity::Moderate));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        match &facts[1].payload {
            FactPayload::Medication { name, dose, frequency } => {
                assert_eq!(name, "aspirin");
                assert_eq!(dose.as_deref(), Some("100mg"));
                assert_eq!(frequency.as_deref(), Some("daily"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn malformed_hints_are_skipped() {
        let hints = json!({
            "symptoms": [{ "severity": "mild" }],
            "vital_signs": [{ "type": "unknown_kind", "value": 10 }]
        });
        let facts = StructuredExtractor.extract(origin(), "all good", &hints, false);
        assert_eq!(facts.len(), 0);
    }

    #[test]
    fn text_scan_can_be_disabled() {
        let facts =
            StructuredExtractor.extract(origin(), "show my headache log", &json!({}), false);
        assert_eq!(facts.len(), 0);
    }
}

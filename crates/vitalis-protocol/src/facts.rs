//! Typed health facts extracted from conversation content.

use crate::turn::{ConversationId, TurnId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Symptom severity scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    /// Parse a severity word, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mild" => Some(Severity::Mild),
            "moderate" => Some(Severity::Moderate),
            "severe" => Some(Severity::Severe),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Vital-sign measurement kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    BloodPressure,
    HeartRate,
    Temperature,
    Weight,
    BloodGlucose,
    OxygenSaturation,
    RespiratoryRate,
}

/// Fact kinds used for dashboard aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Symptom,
    VitalSign,
    Medication,
}

/// Payload for one extracted fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FactPayload {
    /// A reported symptom with optional severity and duration.
    Symptom {
        name: String,
        severity: Option<Severity>,
        duration: Option<String>,
    },
    /// A vital-sign measurement.
    VitalSign {
        vital: VitalKind,
        value: f64,
        unit: String,
    },
    /// A medication the user takes or wants logged.
    Medication {
        name: String,
        dose: Option<String>,
        frequency: Option<String>,
    },
}

impl FactPayload {
    /// Aggregation kind for the payload.
    pub fn kind(&self) -> FactKind {
        match self {
            FactPayload::Symptom { .. } => FactKind::Symptom,
            FactPayload::VitalSign { .. } => FactKind::VitalSign,
            FactPayload::Medication { .. } => FactKind::Medication,
        }
    }
}

/// A persisted structured fact attributed to a conversation turn.
///
/// Facts are append-only; corrections are recorded as new facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFact {
    /// Fact identifier; replaying the same id must not duplicate.
    pub id: Uuid,
    /// Owning user.
    pub user_id: UserId,
    /// Conversation the fact was extracted from.
    pub conversation_id: ConversationId,
    /// Turn the fact was extracted from.
    pub turn_id: TurnId,
    /// Typed payload.
    pub payload: FactPayload,
    /// Extraction timestamp.
    pub recorded_at: DateTime<Utc>,
}

impl ExtractedFact {
    /// Build a fact with a fresh id and current timestamp.
    pub fn new(
        user_id: UserId,
        conversation_id: ConversationId,
        turn_id: TurnId,
        payload: FactPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            conversation_id,
            turn_id,
            payload,
            recorded_at: Utc::now(),
        }
    }
}

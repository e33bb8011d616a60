//! Routing intents produced by the classifier.

use serde::{Deserialize, Serialize};

/// The single chosen handling category for a message.
///
/// The set is closed: every responder is registered against one of these
/// variants and dispatch never falls outside of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// User describes symptoms or health complaints.
    Symptom,
    /// Questions about a medication, including interaction checks.
    Medication,
    /// User refers to an uploaded medical report.
    Report,
    /// User wants help understanding possible explanations.
    Diagnosis,
    /// User wants to see previously logged health data.
    Tracking,
    /// General health conversation; also the degradation fallback.
    General,
    /// Message unrelated to health; terminal short-circuit.
    OffTopic,
}

impl Intent {
    /// Return the intent as its snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Symptom => "symptom",
            Intent::Medication => "medication",
            Intent::Report => "report",
            Intent::Diagnosis => "diagnosis",
            Intent::Tracking => "tracking",
            Intent::General => "general",
            Intent::OffTopic => "off_topic",
        }
    }

    /// Parse a classifier label into an intent.
    ///
    /// Unknown or ambiguous labels return `None`; callers resolve those
    /// to [`Intent::General`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "symptom" => Some(Intent::Symptom),
            "medication" => Some(Intent::Medication),
            "report" => Some(Intent::Report),
            "diagnosis" => Some(Intent::Diagnosis),
            "tracking" => Some(Intent::Tracking),
            "general" => Some(Intent::General),
            "off_topic" | "off-topic" => Some(Intent::OffTopic),
            _ => None,
        }
    }

    /// All intents, in registry order.
    pub fn all() -> [Intent; 7] {
        [
            Intent::Symptom,
            Intent::Medication,
            Intent::Report,
            Intent::Diagnosis,
            Intent::Tracking,
            Intent::General,
            Intent::OffTopic,
        ]
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_round_trips_labels() {
        for intent in Intent::all() {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        assert_eq!(Intent::parse("weather"), None);
        assert_eq!(Intent::parse(""), None);
    }

    #[test]
    fn parse_accepts_hyphenated_off_topic() {
        assert_eq!(Intent::parse("Off-Topic"), Some(Intent::OffTopic));
    }
}

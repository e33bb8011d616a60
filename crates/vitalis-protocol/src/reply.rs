//! Final reply payload returned by the orchestrator.

use crate::facts::ExtractedFact;
use crate::intent::Intent;
use crate::turn::{ConversationId, TurnId};
use serde::{Deserialize, Serialize};

/// Tri-level medication safety verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyVerdict {
    Safe,
    Caution,
    HighRisk,
}

impl SafetyVerdict {
    /// Return the verdict as its wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyVerdict::Safe => "SAFE",
            SafetyVerdict::Caution => "CAUTION",
            SafetyVerdict::HighRisk => "HIGH_RISK",
        }
    }
}

/// Result of one fully processed conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalReply {
    /// Conversation the turn belongs to.
    pub conversation_id: ConversationId,
    /// Id of the persisted user turn.
    pub user_turn_id: TurnId,
    /// Id of the persisted assistant turn.
    pub assistant_turn_id: TurnId,
    /// Routing decision the turn was handled under.
    pub intent: Intent,
    /// Assistant reply text.
    pub text: String,
    /// Structured facts recorded during the turn.
    pub facts: Vec<ExtractedFact>,
    /// Medication safety verdict, when the turn produced one.
    pub safety_verdict: Option<SafetyVerdict>,
    /// True when the selected responder failed and the reply came from
    /// the degradation fallback. Provider gaps alone never set this.
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::SafetyVerdict;
    use pretty_assertions::assert_eq;

    #[test]
    fn verdict_labels_are_screaming_snake_case() {
        assert_eq!(SafetyVerdict::HighRisk.as_str(), "HIGH_RISK");
        let json = serde_json::to_string(&SafetyVerdict::HighRisk).expect("serialize");
        assert_eq!(json, "\"HIGH_RISK\"");
    }
}

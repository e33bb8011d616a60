//! Conversation turns and speaker roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a conversation.
pub type ConversationId = Uuid;
/// Unique identifier for a turn.
pub type TurnId = Uuid;
/// Unique identifier for a user.
pub type UserId = Uuid;
/// Unique identifier for an uploaded document.
pub type DocumentId = Uuid;

/// Speaker role for a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored turn.
    User,
    /// Assistant-authored turn.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role from a lowercase string.
    pub fn parse(value: &str) -> Self {
        if value == "assistant" {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(value))
    }
}

/// One message within a conversation. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Turn identifier.
    pub id: TurnId,
    /// Conversation the turn belongs to.
    pub conversation_id: ConversationId,
    /// Role that produced the turn.
    pub role: Role,
    /// Turn text content.
    pub text: String,
    /// Optional reference to an uploaded document.
    pub document_ref: Option<DocumentId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Build a new turn with a fresh id and current timestamp.
    pub fn new(conversation_id: ConversationId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            text: text.into(),
            document_ref: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a document reference to the turn.
    pub fn with_document(mut self, document_ref: DocumentId) -> Self {
        self.document_ref = Some(document_ref);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, Turn};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!(Role::parse("assistant"), Role::Assistant);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("anything-else"), Role::User);
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn turn_builder_attaches_document_ref() {
        let conversation_id = Uuid::new_v4();
        let document_id = Uuid::new_v4();
        let turn = Turn::new(conversation_id, Role::User, "see my report")
            .with_document(document_id);
        assert_eq!(turn.conversation_id, conversation_id);
        assert_eq!(turn.document_ref, Some(document_id));
        assert_eq!(turn.role, Role::User);
    }
}

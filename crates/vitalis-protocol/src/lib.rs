//! Shared data model and capability traits for Vitalis.
//!
//! Everything that crosses a crate boundary lives here: turns and roles,
//! routing intents, extracted health facts, user profiles, final replies,
//! and the capability traits consumed from external collaborators
//! (text generation and text embedding).

mod facts;
mod generate;
mod intent;
mod profile;
mod reply;
mod turn;

pub use facts::{ExtractedFact, FactKind, FactPayload, Severity, VitalKind};
pub use generate::{GenerationError, TextEmbedder, TextGenerator};
pub use intent::Intent;
pub use profile::{AllergyEntry, ConditionEntry, Demographics, MedicationEntry, UserProfile};
pub use reply::{FinalReply, SafetyVerdict};
pub use turn::{ConversationId, DocumentId, Role, Turn, TurnId, UserId};

//! Core orchestration for the Vitalis health-dialogue assistant.
//!
//! One conversational turn flows strictly forward: classify the intent,
//! load memory, dispatch to the matching responder, extract structured
//! facts, persist the turn pair, and hand back a single coherent reply.

mod classifier;
mod error;
mod extractor;
mod facts;
mod history;
mod orchestrator;
pub mod responders;

pub use classifier::IntentClassifier;
pub use error::CoreError;
pub use extractor::{FactOrigin, StructuredExtractor};
pub use facts::{FactStore, FactWindow, JsonlFactStore};
pub use history::{HistoryStore, JsonlHistoryStore, StateError};
pub use orchestrator::{MISSING_DOCUMENT_REPLY, OFF_TOPIC_REPLY, Orchestrator, TurnRequest};

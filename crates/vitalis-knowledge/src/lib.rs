//! External Knowledge Gateway for Vitalis.
//!
//! A uniform façade over independent reference-data providers: drug
//! labels, standardized drug names, interaction texts, literature
//! search, condition codes and uploaded-document text. Every call is
//! independent, cacheable and allowed to fail without failing the turn;
//! exhausted calls come back tagged `unavailable` rather than as errors.

mod cache;
mod error;
mod gateway;
mod types;

pub use error::KnowledgeError;
pub use gateway::KnowledgeGateway;
pub use types::{
    Article, ConditionCode, DocumentText, DrugConcept, DrugFacts, KnowledgeClient,
    KnowledgeOutcome, KnowledgePayload, KnowledgeQuery, KnowledgeQueryResult, ProviderKind,
};

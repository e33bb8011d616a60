//! Query and result types for the knowledge gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a reference-data provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    DrugFacts,
    StandardizedDrugName,
    DrugInteractions,
    LiteratureSearch,
    ConditionCodes,
    DocumentTextExtraction,
}

impl ProviderKind {
    /// Return the provider as its kebab-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DrugFacts => "drug-facts",
            ProviderKind::StandardizedDrugName => "standardized-drug-name",
            ProviderKind::DrugInteractions => "drug-interactions",
            ProviderKind::LiteratureSearch => "literature-search",
            ProviderKind::ConditionCodes => "condition-codes",
            ProviderKind::DocumentTextExtraction => "document-text-extraction",
        }
    }
}

/// A single provider query with normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeQuery {
    /// Look up a drug label by name.
    DrugFacts { name: String },
    /// Resolve standardized drug concepts by name.
    StandardizedDrugName { name: String },
    /// Fetch interaction text for a drug.
    DrugInteractions { name: String },
    /// Search medical literature.
    LiteratureSearch { query: String, max_results: usize },
    /// Look up condition codes for a term.
    ConditionCodes { term: String },
    /// Fetch extracted text for an uploaded document.
    DocumentTextExtraction { document_id: Uuid },
}

impl KnowledgeQuery {
    /// Provider the query targets.
    pub fn provider(&self) -> ProviderKind {
        match self {
            KnowledgeQuery::DrugFacts { .. } => ProviderKind::DrugFacts,
            KnowledgeQuery::StandardizedDrugName { .. } => ProviderKind::StandardizedDrugName,
            KnowledgeQuery::DrugInteractions { .. } => ProviderKind::DrugInteractions,
            KnowledgeQuery::LiteratureSearch { .. } => ProviderKind::LiteratureSearch,
            KnowledgeQuery::ConditionCodes { .. } => ProviderKind::ConditionCodes,
            KnowledgeQuery::DocumentTextExtraction { .. } => {
                ProviderKind::DocumentTextExtraction
            }
        }
    }

    /// Cache key over the provider and normalized parameters.
    pub fn cache_key(&self) -> String {
        let params = match self {
            KnowledgeQuery::DrugFacts { name }
            | KnowledgeQuery::StandardizedDrugName { name }
            | KnowledgeQuery::DrugInteractions { name } => normalize(name),
            KnowledgeQuery::LiteratureSearch { query, max_results } => {
                format!("{}:{max_results}", normalize(query))
            }
            KnowledgeQuery::ConditionCodes { term } => normalize(term),
            KnowledgeQuery::DocumentTextExtraction { document_id } => document_id.to_string(),
        };
        format!("{}:{params}", self.provider().as_str())
    }
}

/// Lowercase and collapse whitespace for stable cache keys.
fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Normalized drug label fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DrugFacts {
    pub brand_name: Option<String>,
    pub generic_name: Option<String>,
    pub purpose: Option<String>,
    pub warnings: Option<String>,
    pub active_ingredient: Option<String>,
    pub dosage: Option<String>,
    pub adverse_reactions: Option<String>,
}

/// One standardized drug concept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugConcept {
    pub rxcui: String,
    pub name: String,
    pub tty: Option<String>,
}

/// One literature search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub source: Option<String>,
    pub pubdate: Option<String>,
    pub url: String,
}

/// One condition code match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionCode {
    pub code: String,
    pub description: String,
}

/// Extraction state of an uploaded document's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status", content = "text")]
pub enum DocumentText {
    /// Extraction finished; text is available.
    Ready(String),
    /// Extraction has not completed yet; retry shortly.
    Pending,
}

/// Normalized payload for one provider answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "payload")]
pub enum KnowledgePayload {
    DrugFacts(DrugFacts),
    DrugConcepts(Vec<DrugConcept>),
    Interactions { text: String },
    Literature(Vec<Article>),
    ConditionCodes(Vec<ConditionCode>),
    DocumentText(DocumentText),
}

/// Availability of one provider answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum KnowledgeOutcome {
    /// Provider answered with normalized data.
    Available(KnowledgePayload),
    /// Provider could not answer; callers proceed without this evidence.
    Unavailable { reason: String },
}

/// One provider answer for one orchestrator turn. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeQueryResult {
    /// Provider that produced the answer.
    pub provider: ProviderKind,
    /// Answer payload or unavailability marker.
    pub outcome: KnowledgeOutcome,
}

impl KnowledgeQueryResult {
    /// Build an available result.
    pub fn available(provider: ProviderKind, payload: KnowledgePayload) -> Self {
        Self {
            provider,
            outcome: KnowledgeOutcome::Available(payload),
        }
    }

    /// Build an unavailable result.
    pub fn unavailable(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self {
            provider,
            outcome: KnowledgeOutcome::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// True when the provider answered.
    pub fn is_available(&self) -> bool {
        matches!(self.outcome, KnowledgeOutcome::Available(_))
    }

    /// Payload when available.
    pub fn payload(&self) -> Option<&KnowledgePayload> {
        match &self.outcome {
            KnowledgeOutcome::Available(payload) => Some(payload),
            KnowledgeOutcome::Unavailable { .. } => None,
        }
    }
}

/// Gateway interface consumed by responders and tests.
#[async_trait]
pub trait KnowledgeClient: Send + Sync {
    /// Execute one provider query. Always resolves; failures surface as
    /// `KnowledgeOutcome::Unavailable`, never as an error.
    async fn query(&self, query: KnowledgeQuery) -> KnowledgeQueryResult;
}

//! Configuration schema for Vitalis.

use serde::{Deserialize, Serialize};

/// Root config for the Vitalis SDK.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VitalisConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl VitalisConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> VitalisConfigBuilder {
        VitalisConfigBuilder::new()
    }
}

/// Builder for assembling a `VitalisConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct VitalisConfigBuilder {
    config: VitalisConfig,
}

impl VitalisConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: VitalisConfig::default(),
        }
    }

    /// Replace the orchestrator configuration.
    pub fn orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.config.orchestrator = orchestrator;
        self
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the knowledge gateway configuration.
    pub fn knowledge(mut self, knowledge: KnowledgeConfig) -> Self {
        self.config.knowledge = knowledge;
        self
    }

    /// Replace the turn-history persistence configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Finalize and return the built `VitalisConfig`.
    pub fn build(self) -> VitalisConfig {
        self.config
    }
}

/// Orchestrator pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum turns rendered into classifier and responder prompts.
    #[serde(default = "default_prompt_window_turns")]
    pub prompt_window_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            prompt_window_turns: default_prompt_window_turns(),
        }
    }
}

fn default_prompt_window_turns() -> usize {
    10
}

/// Two-tier memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Capacity of the recent-turn window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Summarize every this-many persisted turns.
    #[serde(default = "default_summary_cadence")]
    pub summary_cadence: usize,
    /// Number of summaries recalled per turn.
    #[serde(default = "default_recall_k")]
    pub recall_k: usize,
    /// Maximum summary length in characters.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    /// Root directory for the summary archive.
    #[serde(default)]
    pub path: Option<String>,
    /// Retry policy for detached summarization.
    #[serde(default)]
    pub retry: SummaryRetryConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            summary_cadence: default_summary_cadence(),
            recall_k: default_recall_k(),
            summary_max_chars: default_summary_max_chars(),
            path: None,
            retry: SummaryRetryConfig::default(),
        }
    }
}

/// Default recent-turn window capacity.
fn default_window_size() -> usize {
    20
}

/// Default summarization cadence in turns.
fn default_summary_cadence() -> usize {
    10
}

/// Default number of summaries recalled per turn.
fn default_recall_k() -> usize {
    3
}

/// Default maximum summary length.
fn default_summary_max_chars() -> usize {
    1500
}

/// Backoff policy for summarization retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRetryConfig {
    /// Maximum attempts before the mechanical fallback digest.
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for SummaryRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

/// Knowledge gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_knowledge_timeout_ms")]
    pub timeout_ms: u64,
    /// Cache entry lifetime in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum literature results per query.
    #[serde(default = "default_literature_max_results")]
    pub literature_max_results: usize,
    /// Provider endpoint overrides.
    #[serde(default)]
    pub endpoints: KnowledgeEndpoints,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_knowledge_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            literature_max_results: default_literature_max_results(),
            endpoints: KnowledgeEndpoints::default(),
        }
    }
}

/// Default per-call gateway timeout.
fn default_knowledge_timeout_ms() -> u64 {
    5_000
}

/// Default gateway cache TTL.
fn default_cache_ttl_secs() -> u64 {
    300
}

/// Default literature result count.
fn default_literature_max_results() -> usize {
    5
}

/// Base URLs for the reference-data providers.
///
/// Overridable so tests can point the gateway at local fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEndpoints {
    #[serde(default = "default_drug_label_url")]
    pub drug_label: String,
    #[serde(default = "default_rxnorm_url")]
    pub rxnorm: String,
    #[serde(default = "default_pubmed_search_url")]
    pub pubmed_search: String,
    #[serde(default = "default_pubmed_summary_url")]
    pub pubmed_summary: String,
    #[serde(default = "default_condition_codes_url")]
    pub condition_codes: String,
    #[serde(default = "default_document_text_url")]
    pub document_text: String,
}

impl Default for KnowledgeEndpoints {
    fn default() -> Self {
        Self {
            drug_label: default_drug_label_url(),
            rxnorm: default_rxnorm_url(),
            pubmed_search: default_pubmed_search_url(),
            pubmed_summary: default_pubmed_summary_url(),
            condition_codes: default_condition_codes_url(),
            document_text: default_document_text_url(),
        }
    }
}

fn default_drug_label_url() -> String {
    "https://api.fda.gov/drug/label.json".to_string()
}

fn default_rxnorm_url() -> String {
    "https://rxnav.nlm.nih.gov/REST/drugs.json".to_string()
}

fn default_pubmed_search_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string()
}

fn default_pubmed_summary_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi".to_string()
}

fn default_condition_codes_url() -> String {
    "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search".to_string()
}

fn default_document_text_url() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

/// Turn-history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Root directory for turn and fact storage.
    #[serde(default)]
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{MemoryConfig, VitalisConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_constants() {
        let config = VitalisConfig::default();
        assert_eq!(config.memory.window_size, 20);
        assert_eq!(config.memory.summary_cadence, 10);
        assert_eq!(config.memory.recall_k, 3);
        assert_eq!(config.knowledge.timeout_ms, 5_000);
    }

    #[test]
    fn builder_overrides_sections() {
        let config = VitalisConfig::builder()
            .memory(MemoryConfig {
                window_size: 4,
                summary_cadence: 2,
                ..MemoryConfig::default()
            })
            .build();
        assert_eq!(config.memory.window_size, 4);
        assert_eq!(config.memory.summary_cadence, 2);
        assert_eq!(config.memory.recall_k, 3);
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: VitalisConfig = serde_json::from_str("{}").expect("decode");
        assert_eq!(config.memory.window_size, 20);
        assert_eq!(
            config.knowledge.endpoints.drug_label,
            "https://api.fda.gov/drug/label.json"
        );
    }
}

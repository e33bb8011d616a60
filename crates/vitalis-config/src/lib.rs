//! Configuration schema and loading for Vitalis.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file};
pub use model::{
    HistoryConfig, KnowledgeConfig, KnowledgeEndpoints, MemoryConfig, OrchestratorConfig,
    SummaryRetryConfig, VitalisConfig, VitalisConfigBuilder,
};

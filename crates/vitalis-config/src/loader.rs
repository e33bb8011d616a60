//! Config file loading and validation.
//!
//! Discovers a `vitalis.json5` file (explicit path, `VITALIS_CONFIG` env
//! var, or the working directory), parses it as JSON5, and validates the
//! resulting `VitalisConfig`.

use crate::{ConfigError, VitalisConfig};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "vitalis.json5";
/// Environment variable overriding the config path.
const CONFIG_PATH_ENV: &str = "VITALIS_CONFIG";

/// Load config for the given working directory.
///
/// Resolution order: `VITALIS_CONFIG` env var, then
/// `<cwd>/vitalis.json5`, then built-in defaults.
pub fn load_config(cwd: &Path) -> Result<VitalisConfig, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        debug!("loading config from env override (path={path})");
        return load_config_file(PathBuf::from(path));
    }
    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return load_config_file(local);
    }
    debug!("no config file found, using defaults (cwd={})", cwd.display());
    Ok(VitalisConfig::default())
}

/// Load and validate a single config file.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<VitalisConfig, ConfigError> {
    let path = path.as_ref();
    info!("loading config (path={})", path.display());
    let raw = fs::read_to_string(path)?;
    let config: VitalisConfig = json5::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

/// Validate field constraints that serde defaults cannot express.
fn validate(config: &VitalisConfig) -> Result<(), ConfigError> {
    if config.memory.window_size == 0 {
        return Err(invalid("memory.window_size", "must be at least 1"));
    }
    if config.memory.summary_cadence == 0 {
        return Err(invalid("memory.summary_cadence", "must be at least 1"));
    }
    if config.memory.recall_k == 0 {
        return Err(invalid("memory.recall_k", "must be at least 1"));
    }
    if config.knowledge.timeout_ms == 0 {
        return Err(invalid("knowledge.timeout_ms", "must be positive"));
    }
    Ok(())
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

//! Locating and reading the config file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::env::substitute_env_vars_with;
use crate::schema::MedibookConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Medibook config directory.
/// Priority: `MEDIBOOK_CONFIG_DIR` env > `~/.medibook/` > `./.medibook`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDIBOOK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".medibook"),
        None => PathBuf::from(".medibook"),
    }
}

/// Pick the config file: explicit path > `MEDIBOOK_CONFIG` > config dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("MEDIBOOK_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    config_dir().join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk, substituting `${VAR}` references
/// from the process environment.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<MedibookConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(MedibookConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw, &std::env::vars().collect())
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text and substitute env references from `env`.
pub fn parse_config(raw: &str, env: &HashMap<String, String>) -> Result<MedibookConfig> {
    let value: Value = serde_yaml::from_str(raw).context("Failed to parse config YAML")?;
    // An empty document parses as null.
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    let value = substitute_env_vars_with(&value, env)?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}

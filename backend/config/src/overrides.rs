//! Environment-variable overrides applied on top of the config file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::schema::MedibookConfig;

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: MedibookConfig) -> Result<MedibookConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from `env`. `MEDIBOOK_PORT` beats the plain `PORT`.
pub fn apply_env_overrides_with(
    mut config: MedibookConfig,
    env: &HashMap<String, String>,
) -> Result<MedibookConfig> {
    if let Some(port) = parsed::<u16>(env, "PORT")? {
        config.server.port = port;
    }
    if let Some(port) = parsed::<u16>(env, "MEDIBOOK_PORT")? {
        config.server.port = port;
    }
    if let Some(bind) = text(env, "MEDIBOOK_BIND") {
        config.server.bind = bind;
    }
    if let Some(dir) = text(env, "MEDIBOOK_UPLOADS_DIR") {
        config.server.uploads_dir = PathBuf::from(dir);
    }
    if let Some(tz) = text(env, "MEDIBOOK_DEFAULT_TZ") {
        config.scheduling.default_timezone = tz;
    }
    if let Some(instant) = parsed::<DateTime<Utc>>(env, "MEDIBOOK_REFERENCE_INSTANT")? {
        config.scheduling.reference_instant = Some(instant);
    }
    if let Some(binary) = text(env, "MEDIBOOK_OCR_BINARY") {
        config.ocr.binary = PathBuf::from(binary);
    }
    if let Some(language) = text(env, "MEDIBOOK_OCR_LANG") {
        config.ocr.language = language;
    }
    if let Some(secs) = parsed::<u64>(env, "MEDIBOOK_OCR_TIMEOUT_SECS")? {
        config.ocr.timeout_secs = secs;
    }
    if let Some(dir) = text(env, "MEDIBOOK_LOG_DIR") {
        config.logging.dir = Some(PathBuf::from(dir));
    }
    Ok(config)
}

fn text(env: &HashMap<String, String>, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parsed<T>(env: &HashMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text(env, key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("Invalid value for {key}: {raw:?}"))
        })
        .transpose()
}

//! `medibook-config`: runtime configuration for the Medibook service.
//!
//! Provides:
//! - Typed config schema with defaults for every field
//! - YAML loading with `${ENV_VAR}` substitution
//! - Environment-variable overrides (`PORT`, `MEDIBOOK_*`)
//! - Validation with path-qualified errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use env::{substitute_env_vars, substitute_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, load_config, parse_config, resolve_config_path};
pub use overrides::{apply_env_overrides, apply_env_overrides_with};
pub use schema::{LoggingConfig, MedibookConfig, OcrConfig, SchedulingConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load the file, apply env overrides, and validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// errors abort; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<MedibookConfig> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        let details: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    Ok(config)
}

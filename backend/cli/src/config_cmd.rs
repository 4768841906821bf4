//! `medibook config`: show the effective configuration.

use std::path::Path;

use anyhow::Result;

use medibook_config::{apply_env_overrides, load_config, resolve_config_path, validate};

/// Unlike startup, an invalid config is printed rather than rejected.
pub async fn run(explicit: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(explicit);
    let config = apply_env_overrides(load_config(&path).await?)?;

    println!("# {}", path.display());
    print!("{}", serde_yaml::to_string(&config)?);

    let report = validate(&config);
    for warning in &report.warnings {
        println!("# warning: {warning}");
    }
    for error in &report.errors {
        println!("# error: {error}");
    }
    if report.is_valid() {
        println!("# configuration is valid");
    }
    Ok(())
}

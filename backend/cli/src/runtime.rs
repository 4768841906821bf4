//! Turns a loaded config into running components.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use medibook_config::{load_and_prepare, resolve_config_path, MedibookConfig};
use medibook_gateway::GatewayState;
use medibook_intake::{ReferenceClock, RequestOrchestrator};
use medibook_understanding::TesseractCli;

/// Resolve, load, override and validate the config.
pub async fn load(explicit: Option<&Path>) -> Result<MedibookConfig> {
    load_and_prepare(&resolve_config_path(explicit)).await
}

pub fn init_logging(config: &MedibookConfig) -> Result<()> {
    medibook_logging::init_logger(&config.logging.level, config.logging.dir.as_deref())
}

pub fn build_orchestrator(config: &MedibookConfig) -> RequestOrchestrator {
    let engine = TesseractCli::new(&config.ocr.binary).with_language(&config.ocr.language);
    RequestOrchestrator::new(Arc::new(engine))
        .with_clock(ReferenceClock::from(config.scheduling.reference_instant))
        .with_ocr_timeout(Duration::from_secs(config.ocr.timeout_secs))
}

pub fn gateway_state(config: &MedibookConfig) -> GatewayState {
    GatewayState::new(
        build_orchestrator(config),
        config.scheduling.default_timezone.clone(),
        &config.server.uploads_dir,
        config.server.max_upload_bytes,
    )
}

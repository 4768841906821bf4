//! `medibook parse`: run one request through the orchestrator.

use std::path::PathBuf;

use anyhow::Result;
use tracing::error;

use medibook_config::MedibookConfig;
use medibook_core::{AppointmentInput, ScheduleError, ScheduleOutcome, ScheduleResponse};

use crate::runtime;

/// Prints the same envelope the HTTP API returns. Errors are printed too and
/// then propagated so the process exits non-zero.
pub async fn run(
    config: &MedibookConfig,
    text: Option<String>,
    image: Option<PathBuf>,
    timezone: Option<String>,
) -> Result<()> {
    let input = match (image, text.filter(|t| !t.is_empty())) {
        (Some(path), _) => AppointmentInput::Image(path),
        (None, Some(text)) => AppointmentInput::Text(text),
        (None, None) => return report(Err(ScheduleError::missing_input())),
    };
    let timezone = timezone.unwrap_or_else(|| config.scheduling.default_timezone.clone());

    let orchestrator = runtime::build_orchestrator(config);
    report(orchestrator.handle(input, &timezone).await)
}

fn report(result: Result<ScheduleOutcome, ScheduleError>) -> Result<()> {
    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&ScheduleResponse::from(outcome))?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Parse failed");
            println!("{}", serde_json::to_string_pretty(&ScheduleResponse::from(&e))?);
            Err(e.into())
        }
    }
}

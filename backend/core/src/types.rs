use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Timezone used when a request does not name one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// What the caller handed us: raw text, or an image on disk that needs OCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentInput {
    Text(String),
    Image(PathBuf),
}

impl AppointmentInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

/// A fully resolved appointment, rendered in the requested timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAppointment {
    pub department: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour clock.
    pub time: String,
    #[serde(rename = "tz")]
    pub timezone: String,
}

/// Which piece of the appointment could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClarificationReason {
    NoDate,
    NoDepartment,
}

impl ClarificationReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoDate => "Could not determine a valid date or time.",
            Self::NoDepartment => "Could not determine the department.",
        }
    }
}

impl fmt::Display for ClarificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A successful-but-incomplete outcome: the caller should rephrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationNeeded {
    pub reason: ClarificationReason,
    pub message: String,
}

impl From<ClarificationReason> for ClarificationNeeded {
    fn from(reason: ClarificationReason) -> Self {
        Self {
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// Non-error result of handling a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(ParsedAppointment),
    NeedsClarification(ClarificationNeeded),
}

impl ScheduleOutcome {
    pub fn clarification(reason: ClarificationReason) -> Self {
        Self::NeedsClarification(reason.into())
    }
}

/// Wire envelope shared by the HTTP API and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleResponse {
    Ok { appointment: ParsedAppointment },
    NeedsClarification { message: String },
    Error { message: String },
}

impl From<ScheduleOutcome> for ScheduleResponse {
    fn from(outcome: ScheduleOutcome) -> Self {
        match outcome {
            ScheduleOutcome::Scheduled(appointment) => Self::Ok { appointment },
            ScheduleOutcome::NeedsClarification(c) => Self::NeedsClarification { message: c.message },
        }
    }
}

impl From<&ScheduleError> for ScheduleResponse {
    fn from(err: &ScheduleError) -> Self {
        Self::Error {
            message: err.public_message(),
        }
    }
}

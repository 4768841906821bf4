use thiserror::Error;

/// Message returned to clients for every failure that is not a bad request.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Message returned when a request carries neither text nor an image.
pub const MISSING_INPUT_MESSAGE: &str = "Request must contain either text or an image file.";

/// Errors raised while turning a request into an appointment.
///
/// Clarifications are not errors; see [`crate::ScheduleOutcome`].
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("OCR failed to extract any text from the image")]
    OcrExtractionFailed,

    #[error("OCR engine error: {0}")]
    Ocr(String),

    #[error("OCR timed out after {0}s")]
    OcrTimeout(u64),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("upload error: {0}")]
    Upload(String),
}

impl ScheduleError {
    /// The no-input rejection used by every request surface.
    pub fn missing_input() -> Self {
        Self::BadRequest(MISSING_INPUT_MESSAGE.to_string())
    }

    /// Whether the caller is at fault (maps to 400 rather than 500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }

    /// Message safe to show to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

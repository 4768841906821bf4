pub mod error;
pub mod traits;
pub mod types;

pub use error::ScheduleError;
pub use traits::{OcrEngine, TimeExpressionExtractor};
pub use types::{
    AppointmentInput, ClarificationNeeded, ClarificationReason, ParsedAppointment,
    ScheduleOutcome, ScheduleResponse, DEFAULT_TIMEZONE,
};

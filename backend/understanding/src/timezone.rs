//! IANA timezone parsing and wall-clock formatting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use medibook_core::ScheduleError;

/// Parse an IANA name such as `Asia/Kolkata`.
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

/// Render `instant` in `zone` as separate `YYYY-MM-DD` and `HH:MM` strings.
pub fn format_in_zone(instant: DateTime<Utc>, zone: Tz) -> (String, String) {
    let local = instant.with_timezone(&zone);
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}

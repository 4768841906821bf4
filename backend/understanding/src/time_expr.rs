//! Natural-language date/time extraction.
//!
//! Recognizes the phrasings people use when asking for an appointment
//! ("tomorrow at 3pm", "next friday", "Oct 20th 10:30", "in 2 hours") and
//! resolves them against a reference instant with a forward bias: anything
//! ambiguous lands on the nearest future occurrence.
//!
//! The first day expression and the first clock expression (by position)
//! are combined. A day without a clock time defaults to noon, or to the
//! reference time when that day is today and noon has passed; a clock time
//! without a day means the next time the clock shows it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use medibook_core::TimeExpressionExtractor;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static RELATIVE_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(day after tomorrow|today|tonight|tomorrow|tmrw|tmr)\b").unwrap());

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(this|next)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .unwrap()
});

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bin\s+(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten)\s+(minutes?|mins?|hours?|hrs?|days?|weeks?)\b",
    )
    .unwrap()
});

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static SLASH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").unwrap());

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .unwrap()
});

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .unwrap()
});

static TIME_MERIDIEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?m\b\.?").unwrap());

static TIME_24H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static TIME_AT_HOUR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bat\s+(\d{1,2})\b").unwrap());

static TIME_NAMED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(noon|midday|midnight)\b").unwrap());

/// A day mention, with the clock time to use if the text names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DayMention {
    date: NaiveDate,
    implied_time: NaiveTime,
}

/// What the earliest date-like expression pinned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Day(DayMention),
    /// "in 20 minutes" style offsets are exact instants.
    Instant(DateTime<Utc>),
}

/// Regex-driven extractor for English appointment phrasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedTimeExtractor;

impl RuleBasedTimeExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TimeExpressionExtractor for RuleBasedTimeExtractor {
    fn extract(&self, text: &str, reference: DateTime<Utc>, zone: Tz) -> Option<DateTime<Utc>> {
        let text = text.to_lowercase();
        let today = reference.with_timezone(&zone).date_naive();

        let anchor = earliest([
            find_relative_day(&text, today),
            find_weekday(&text, today),
            find_offset(&text, reference, today),
            find_iso_date(&text),
            find_slash_date(&text, today),
            find_month_day(&text, today),
            find_day_month(&text, today),
        ]);
        let time = earliest([
            find_meridiem_time(&text),
            find_24h_time(&text),
            find_at_hour(&text),
            find_named_time(&text),
        ]);

        match (anchor, time) {
            (Some(Anchor::Instant(instant)), _) => Some(instant),
            (Some(Anchor::Day(day)), Some(time)) => to_utc(zone, day.date, time),
            (Some(Anchor::Day(day)), None) => {
                let implied = to_utc(zone, day.date, day.implied_time)?;
                // Today's implied time never lands behind the reference.
                if day.date == today {
                    Some(implied.max(reference))
                } else {
                    Some(implied)
                }
            }
            (None, Some(time)) => {
                let candidate = to_utc(zone, today, time)?;
                if candidate > reference {
                    Some(candidate)
                } else {
                    to_utc(zone, today.succ_opt()?, time)
                }
            }
            (None, None) => None,
        }
    }
}

/// Earliest match by position; ties go to the earlier finder.
fn earliest<T, const N: usize>(found: [Option<(usize, T)>; N]) -> Option<T> {
    let mut best: Option<(usize, T)> = None;
    for (pos, value) in found.into_iter().flatten() {
        let closer = match &best {
            Some((best_pos, _)) => pos < *best_pos,
            None => true,
        };
        if closer {
            best = Some((pos, value));
        }
    }
    best.map(|(_, value)| value)
}

/// First capture set for which `resolve` yields a value.
fn first_valid<T>(
    re: &Regex,
    text: &str,
    mut resolve: impl FnMut(&Captures<'_>) -> Option<T>,
) -> Option<(usize, T)> {
    re.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        resolve(&caps).map(|value| (start, value))
    })
}

fn to_utc(zone: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn hm(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

fn day(date: NaiveDate) -> Anchor {
    Anchor::Day(DayMention {
        date,
        implied_time: noon(),
    })
}

fn find_relative_day(text: &str, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&RELATIVE_DAY_RE, text, |caps| match &caps[1] {
        "today" => Some(day(today)),
        "tonight" => Some(Anchor::Day(DayMention {
            date: today,
            implied_time: hm(22, 0)?,
        })),
        "tomorrow" | "tmrw" | "tmr" => Some(day(today.succ_opt()?)),
        "day after tomorrow" => Some(day(today.succ_opt()?.succ_opt()?)),
        _ => None,
    })
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    name.parse().ok()
}

fn find_weekday(text: &str, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&WEEKDAY_RE, text, |caps| {
        let target = parse_weekday(&caps[2])?;
        let ahead = (7 + target.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            % 7;
        let ahead = match caps.get(1).map(|m| m.as_str()) {
            Some("next") if ahead == 0 => 7,
            _ => ahead,
        };
        Some(day(today + Duration::days(ahead)))
    })
}

fn parse_count(word: &str) -> Option<i64> {
    match word {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        digits => digits.parse().ok(),
    }
}

fn find_offset(text: &str, reference: DateTime<Utc>, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&OFFSET_RE, text, |caps| {
        let count = parse_count(&caps[1])?;
        let unit = &caps[2];
        if unit.starts_with("min") {
            reference.checked_add_signed(Duration::try_minutes(count)?).map(Anchor::Instant)
        } else if unit.starts_with('h') {
            reference.checked_add_signed(Duration::try_hours(count)?).map(Anchor::Instant)
        } else if unit.starts_with('d') {
            Some(day(today.checked_add_signed(Duration::try_days(count)?)?))
        } else {
            Some(day(today.checked_add_signed(Duration::try_weeks(count)?)?))
        }
    })
}

fn find_iso_date(text: &str) -> Option<(usize, Anchor)> {
    first_valid(&ISO_DATE_RE, text, |caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day_of_month = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day_of_month).map(day)
    })
}

/// A calendar date with an optional year. Year-less dates that already
/// passed this year roll over to next year.
fn forward_date(today: NaiveDate, year: Option<i32>, month: u32, day_of_month: u32) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day_of_month);
    }
    match NaiveDate::from_ymd_opt(today.year(), month, day_of_month) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day_of_month),
    }
}

fn parse_year(caps: &Captures<'_>, index: usize) -> Option<Option<i32>> {
    match caps.get(index) {
        None => Some(None),
        Some(m) => {
            let year: i32 = m.as_str().parse().ok()?;
            Some(Some(if m.as_str().len() == 2 { 2000 + year } else { year }))
        }
    }
}

fn find_slash_date(text: &str, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&SLASH_DATE_RE, text, |caps| {
        let month = caps[1].parse().ok()?;
        let day_of_month = caps[2].parse().ok()?;
        let year = parse_year(caps, 3)?;
        forward_date(today, year, month, day_of_month).map(day)
    })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_month_day(text: &str, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&MONTH_DAY_RE, text, |caps| {
        let month = month_number(&caps[1])?;
        let day_of_month = caps[2].parse().ok()?;
        let year = parse_year(caps, 3)?;
        forward_date(today, year, month, day_of_month).map(day)
    })
}

fn find_day_month(text: &str, today: NaiveDate) -> Option<(usize, Anchor)> {
    first_valid(&DAY_MONTH_RE, text, |caps| {
        let day_of_month = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = parse_year(caps, 3)?;
        forward_date(today, year, month, day_of_month).map(day)
    })
}

fn find_meridiem_time(text: &str) -> Option<(usize, NaiveTime)> {
    first_valid(&TIME_MERIDIEM_RE, text, |caps| {
        let hour: u32 = caps[1].parse().ok()?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        let hour = match (&caps[3], hour) {
            ("a", 12) => 0,
            ("a", h) => h,
            ("p", 12) => 12,
            (_, h) => h + 12,
        };
        hm(hour, minute)
    })
}

fn find_24h_time(text: &str) -> Option<(usize, NaiveTime)> {
    first_valid(&TIME_24H_RE, text, |caps| {
        hm(caps[1].parse().ok()?, caps[2].parse().ok()?)
    })
}

// Positioned at the digit so "at 3 pm" ties with the meridiem match and loses.
fn find_at_hour(text: &str) -> Option<(usize, NaiveTime)> {
    TIME_AT_HOUR_RE.captures_iter(text).find_map(|caps| {
        let digits = caps.get(1)?;
        let after = &text[digits.end()..];
        if after.starts_with(':') {
            return None;
        }
        let time = hm(digits.as_str().parse().ok()?, 0)?;
        Some((digits.start(), time))
    })
}

fn find_named_time(text: &str) -> Option<(usize, NaiveTime)> {
    first_valid(&TIME_NAMED_RE, text, |caps| match &caps[1] {
        "midnight" => hm(0, 0),
        _ => Some(noon()),
    })
}

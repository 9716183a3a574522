use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::attendance::{DATE_FORMAT, LogEntry};

/// Most hours a single day can contribute, however long the shift ran.
pub const DAILY_CAP_HOURS: f64 = 8.0;

/// Accepted wall-clock formats, tried in order. The 12-hour form is what the
/// kiosk writes; chrono matches the meridiem case-insensitively and the space
/// before it is optional.
const CLOCK_FORMATS: [&str; 2] = ["%I:%M %p", "%H:%M"];

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// In/out timestamps of a complete entry. A check-out earlier than the
/// check-in is taken to be on the following day.
fn shift_bounds(entry: &LogEntry) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let day = NaiveDate::parse_from_str(present(&entry.date)?, DATE_FORMAT).ok()?;
    let start = day.and_time(parse_clock(present(&entry.time_in)?)?);
    let mut end = day.and_time(parse_clock(present(&entry.time_out)?)?);

    if end < start {
        end += Duration::hours(24);
    }
    Some((start, end))
}

/// Capped hours worked for one entry; 0 for incomplete or unparseable entries.
pub fn entry_hours(entry: &LogEntry) -> f64 {
    match shift_bounds(entry) {
        Some((start, end)) => {
            let worked = (end - start).num_seconds() as f64 / 3600.0;
            worked.min(DAILY_CAP_HOURS)
        }
        None => 0.0,
    }
}

/// Sum of capped daily hours across the whole log.
pub fn total_hours(logs: &[LogEntry]) -> f64 {
    logs.iter().map(entry_hours).sum()
}

pub fn remaining_hours(quota: f64, total: f64) -> f64 {
    (quota - total).max(0.0)
}

/// Two-decimal rounding used wherever hours leave the engine.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::utils::hours::{round_hours, total_hours};

/// Calendar date format of `LogEntry::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wall-clock format written into `timeIn` / `timeOut` (e.g. `08:05 am`).
pub const TIME_FORMAT: &str = "%I:%M %P";

pub const DEFAULT_HONORIFICS: &str = "Mr.";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "Time-In")]
    #[strum(serialize = "Time-In")]
    TimeIn,
    #[default]
    #[serde(rename = "Time-Out")]
    #[strum(serialize = "Time-Out")]
    TimeOut,
}

/// Reads a field that older documents may hold as `null` or a wrong type;
/// anything unreadable becomes the default instead of failing the document.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A non-array `logs` reads as empty; unreadable items read as empty entries.
fn lenient_logs<'de, D>(deserializer: D) -> Result<Vec<LogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// One calendar day's time-in/time-out pair.
///
/// Every field may be missing in stored documents; entries created by an
/// edit that carries no time are persisted as `{ "date": ... }` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({ "date": "2024-01-01", "timeIn": "08:00 am", "timeOut": "05:00 pm" }))]
pub struct LogEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub time_in: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub time_out: Option<String>,
}

impl LogEntry {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format(DATE_FORMAT).to_string()),
            ..Self::default()
        }
    }
}

/// A person's attendance record, stored under its full name.
///
/// Identity fields stay absent when the stored record lacks them, so a
/// rewrite of the document leaves untouched records as they were.
/// Attributes the kiosk forms send beyond the known ones (scanned ID
/// numbers and the like) are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub honorifics: Option<String>,

    #[serde(
        rename = "full name",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,

    #[serde(default, deserialize_with = "lenient_logs")]
    pub logs: Vec<LogEntry>,

    /// Cache of the hours engine; `null` (an unparseable total) reads as 0.
    #[serde(rename = "totalHours", default, deserialize_with = "lenient")]
    pub total_hours: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceRecord {
    /// First check-in: a new record that is timed in now, with today's entry open.
    pub fn checked_in(full_name: String, now: NaiveDateTime) -> Self {
        let mut entry = LogEntry::for_date(now.date());
        entry.time_in = Some(now.format(TIME_FORMAT).to_string());
        entry.time_out = Some(String::new());

        let mut record = Self {
            honorifics: Some(DEFAULT_HONORIFICS.to_string()),
            full_name: Some(full_name),
            suffix: Some(String::new()),
            status: Some(AttendanceStatus::TimeIn),
            logs: vec![entry],
            ..Self::default()
        };
        record.refresh_total_hours();
        record
    }

    /// Current check-in state; records without one are timed out.
    pub fn status(&self) -> AttendanceStatus {
        self.status.unwrap_or_default()
    }

    /// Recomputes the cached `totalHours` from `logs`.
    pub fn refresh_total_hours(&mut self) {
        self.total_hours = round_hours(total_hours(&self.logs));
    }

    /// Locates the entry for `date`, appending an empty one if there is none.
    pub fn entry_for(&mut self, date: NaiveDate) -> &mut LogEntry {
        let key = date.format(DATE_FORMAT).to_string();
        let index = match self
            .logs
            .iter()
            .position(|entry| entry.date.as_deref() == Some(key.as_str()))
        {
            Some(index) => index,
            None => {
                self.logs.push(LogEntry::for_date(date));
                self.logs.len() - 1
            }
        };
        &mut self.logs[index]
    }
}

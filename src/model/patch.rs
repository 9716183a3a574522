use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Keys that are derived by the store and never taken from a request body.
const DERIVED_KEYS: [&str; 2] = ["logs", "totalHours"];

/// Request body of create and edit.
///
/// Every field is optional; whatever is present is merged over the stored
/// record. `timeIn` / `timeOut` only ever land in today's log entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPatch {
    pub honorifics: Option<String>,

    #[serde(rename = "full name")]
    pub full_name: Option<String>,

    pub suffix: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: Option<AttendanceStatus>,

    #[serde(rename = "timeIn")]
    pub time_in: Option<String>,

    #[serde(rename = "timeOut")]
    pub time_out: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordPatch {
    /// The trimmed `full name`, if one was supplied and is not blank.
    pub fn supplied_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Name the record ends up under after this patch.
    pub fn effective_name(&self, current: &str) -> String {
        self.supplied_name().unwrap_or(current).to_string()
    }
}

/// Free-form attributes with the derived keys stripped.
fn attributes(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in DERIVED_KEYS {
        extra.remove(key);
    }
    extra
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl AttendanceRecord {
    /// New record for a first check-in, built from the create body.
    ///
    /// Status, logs and hours are set by the check-in itself.
    pub fn from_patch(full_name: String, patch: RecordPatch, now: NaiveDateTime) -> Self {
        let RecordPatch {
            honorifics,
            suffix,
            email,
            address,
            extra,
            ..
        } = patch;

        let mut record = Self::checked_in(full_name, now);
        if let Some(honorifics) = non_empty(honorifics) {
            record.honorifics = Some(honorifics);
        }
        record.suffix = Some(suffix.unwrap_or_default());
        record.email = email;
        record.address = address;
        record.extra = attributes(extra);
        record
    }

    /// Shallow-merges `patch` over this record and records the status change
    /// into the `today` log entry.
    pub fn apply_patch(&mut self, patch: RecordPatch, full_name: &str, today: NaiveDate) {
        let RecordPatch {
            honorifics,
            full_name: _,
            suffix,
            email,
            address,
            status,
            time_in,
            time_out,
            extra,
        } = patch;

        let entry = self.entry_for(today);
        match status {
            Some(AttendanceStatus::TimeIn) => {
                if let Some(time_in) = non_empty(time_in) {
                    entry.time_in = Some(time_in);
                }
            }
            Some(AttendanceStatus::TimeOut) => {
                if let Some(time_out) = non_empty(time_out) {
                    entry.time_out = Some(time_out);
                }
            }
            None => {}
        }

        if honorifics.is_some() {
            self.honorifics = honorifics;
        }
        if suffix.is_some() {
            self.suffix = suffix;
        }
        if email.is_some() {
            self.email = email;
        }
        if address.is_some() {
            self.address = address;
        }
        if status.is_some() {
            self.status = status;
        }
        self.full_name = Some(full_name.to_string());
        self.extra.extend(attributes(extra));

        self.refresh_total_hours();
    }
}

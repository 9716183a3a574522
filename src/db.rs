use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::StoreError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, LogEntry};
use crate::model::patch::RecordPatch;
use crate::utils::hours::{remaining_hours, round_hours, total_hours};

/// The whole persisted document: full name -> record, in insertion order.
pub type InternList = IndexMap<String, AttendanceRecord>;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HoursReport {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = 8.0)]
    pub total_hours: f64,
    pub logs: Vec<LogEntry>,
    #[schema(example = 478.0)]
    pub remaining_hours: f64,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    #[schema(example = 12)]
    pub total: usize,
    #[schema(example = 7)]
    pub timed_in: usize,
    #[schema(example = 5)]
    pub timed_out: usize,
    #[schema(example = 312.5)]
    pub total_hours: f64,
}

/// JSON-file backed attendance store.
///
/// Every operation re-reads the document, works on the in-memory copy and
/// rewrites the whole file. Operations are serialized by `lock`, so two
/// requests of this process never interleave their read and write phases.
/// Other processes writing the same file are not coordinated.
pub struct AttendanceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Opens the document at `path`, creating `{}` (and its directory) if missing.
pub fn init_store(path: impl AsRef<Path>) -> Result<AttendanceStore, StoreError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::storage("Failed to create data directory", e))?;
    }

    let store = AttendanceStore {
        path: path.to_path_buf(),
        lock: Mutex::new(()),
    };

    if !path.exists() {
        store.save(&InternList::new())?;
        log::info!("Created empty attendance document at {}", path.display());
    }

    Ok(store)
}

impl AttendanceStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|e| StoreError::storage("Attendance store unavailable", e))
    }

    fn load(&self) -> Result<InternList, StoreError> {
        let data = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::storage("Failed to read file", e))?;

        if data.trim().is_empty() {
            return Ok(InternList::new());
        }

        serde_json::from_str(&data).map_err(|e| StoreError::storage("Invalid JSON format", e))
    }

    /// Writes the document next to the original and renames it into place.
    fn save(&self, interns: &InternList) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(interns)
            .map_err(|e| StoreError::storage("Failed to write file", e))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::storage("Failed to write file", e)
        })
    }

    /// Read-all. Hours are recomputed from the logs, never taken from the file.
    pub fn list(&self, search: Option<&str>) -> Result<InternList, StoreError> {
        let _guard = self.guard()?;
        let mut interns = self.load()?;

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            interns.retain(|name, _| name.to_lowercase().contains(&term));
        }

        for record in interns.values_mut() {
            record.refresh_total_hours();
        }

        debug!(count = interns.len(), "Loaded intern list");
        Ok(interns)
    }

    /// First check-in of a new person.
    pub fn create(
        &self,
        patch: RecordPatch,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, StoreError> {
        let full_name = patch
            .supplied_name()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Validation("Missing full name in data".to_string()))?;

        let _guard = self.guard()?;
        let mut interns = self.load()?;

        if interns.contains_key(&full_name) {
            return Err(StoreError::Conflict(format!(
                "Intern '{}' already exists. Use PATCH to edit.",
                full_name
            )));
        }

        let record = AttendanceRecord::from_patch(full_name.clone(), patch, now);
        interns.insert(full_name.clone(), record.clone());
        self.save(&interns)?;

        info!(name = %full_name, status = %record.status(), "Intern checked in");
        Ok(record)
    }

    /// Edits, checks in/out and renames an existing record.
    pub fn edit(
        &self,
        name: &str,
        patch: RecordPatch,
        today: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        let old_name = name.trim();
        let new_name = patch.effective_name(old_name);

        let _guard = self.guard()?;
        let mut interns = self.load()?;

        if !interns.contains_key(old_name) {
            return Err(StoreError::not_found(old_name));
        }
        if new_name != old_name && interns.contains_key(&new_name) {
            return Err(StoreError::Conflict(format!(
                "Intern '{}' already exists",
                new_name
            )));
        }

        let record = interns
            .get_mut(old_name)
            .ok_or_else(|| StoreError::not_found(old_name))?;
        record.apply_patch(patch, &new_name, today);
        let updated = record.clone();

        if new_name != old_name {
            interns.shift_remove(old_name);
            interns.insert(new_name.clone(), updated.clone());
            info!(from = %old_name, to = %new_name, "Intern renamed");
        }

        self.save(&interns)?;

        info!(name = %new_name, status = %updated.status(), total_hours = updated.total_hours, "Intern updated");
        Ok(updated)
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut interns = self.load()?;

        if interns.shift_remove(name).is_none() {
            return Err(StoreError::not_found(name));
        }
        self.save(&interns)?;

        info!(name = %name, "Intern deleted");
        Ok(())
    }

    /// Worked and remaining hours of one person against `quota`.
    pub fn hours(&self, name: &str, quota: f64) -> Result<HoursReport, StoreError> {
        let name = name.trim();

        let _guard = self.guard()?;
        let mut interns = self.load()?;

        let record = interns
            .shift_remove(name)
            .ok_or_else(|| StoreError::not_found(name))?;
        let total = total_hours(&record.logs);

        Ok(HoursReport {
            name: name.to_string(),
            total_hours: round_hours(total),
            logs: record.logs,
            remaining_hours: remaining_hours(quota, total),
        })
    }

    /// Head counts by status and the hours rendered across everyone.
    pub fn summary(&self) -> Result<ActivitySummary, StoreError> {
        let interns = self.list(None)?;

        let timed_in = interns
            .values()
            .filter(|r| r.status() == AttendanceStatus::TimeIn)
            .count();
        let total: f64 = interns.values().map(|r| total_hours(&r.logs)).sum();

        Ok(ActivitySummary {
            total: interns.len(),
            timed_in,
            timed_out: interns.len() - timed_in,
            total_hours: round_hours(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn store() -> (TempDir, AttendanceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = init_store(dir.path().join("data").join("interns.json")).unwrap();
        (dir, store)
    }

    fn patch(body: Value) -> RecordPatch {
        serde_json::from_value(body).unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn on_disk(store: &AttendanceStore) -> Value {
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap()
    }

    #[test]
    fn init_creates_empty_document() {
        let (_dir, store) = store();
        assert_eq!(on_disk(&store), json!({}));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn init_keeps_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interns.json");
        fs::write(&path, r#"{ "Jane Doe": { "full name": "Jane Doe" } }"#).unwrap();

        let store = init_store(&path).unwrap();
        assert!(store.list(None).unwrap().contains_key("Jane Doe"));
    }

    #[test]
    fn create_then_list() {
        let (_dir, store) = store();
        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"))
            .unwrap();

        let interns = store.list(None).unwrap();
        let jane = &interns["Jane Doe"];
        assert_eq!(jane.status(), AttendanceStatus::TimeIn);
        assert_eq!(jane.logs.len(), 1);
        assert_eq!(jane.logs[0].date.as_deref(), Some("2024-03-04"));
        assert_eq!(jane.logs[0].time_in.as_deref(), Some("08:00 am"));
        assert_eq!(jane.total_hours, 0.0);

        assert_eq!(on_disk(&store)["Jane Doe"]["status"], json!("Time-In"));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn create_rejects_missing_name_and_duplicates() {
        let (_dir, store) = store();
        let now = at("2024-03-04", "08:00");

        let missing = store.create(patch(json!({ "email": "x@y.z" })), now);
        assert!(matches!(missing, Err(StoreError::Validation(_))));

        store.create(patch(json!({ "full name": "Jane Doe" })), now).unwrap();
        let duplicate = store.create(patch(json!({ "full name": "Jane Doe" })), now);
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn check_out_then_hours() {
        let (_dir, store) = store();
        let today = day("2024-03-04");
        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "07:58"))
            .unwrap();

        store
            .edit(
                "Jane Doe",
                patch(json!({ "status": "Time-In", "timeIn": "08:00 am" })),
                today,
            )
            .unwrap();
        let updated = store
            .edit(
                "Jane Doe",
                patch(json!({ "status": "Time-Out", "timeOut": "05:00 pm" })),
                today,
            )
            .unwrap();
        assert_eq!(updated.total_hours, 8.0);
        assert_eq!(updated.status(), AttendanceStatus::TimeOut);

        let report = store.hours(" Jane Doe ", 486.0).unwrap();
        assert_eq!(report.name, "Jane Doe");
        assert_eq!(report.total_hours, 8.0);
        assert_eq!(report.remaining_hours, 478.0);
        assert_eq!(report.logs.len(), 1);
    }

    #[test]
    fn stale_stored_hours_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interns.json");
        fs::write(
            &path,
            serde_json::to_string(&json!({
                "Jane Doe": {
                    "full name": "Jane Doe",
                    "totalHours": 123,
                    "logs": [{ "date": "2024-01-01", "timeIn": "09:00 am", "timeOut": "11:00 am" }]
                }
            }))
            .unwrap(),
        )
        .unwrap();

        let store = init_store(&path).unwrap();
        assert_eq!(store.list(None).unwrap()["Jane Doe"].total_hours, 2.0);
    }

    #[test]
    fn rename_relocates_record() {
        let (_dir, store) = store();
        let now = at("2024-03-04", "08:00");
        store.create(patch(json!({ "full name": "Jane Doe" })), now).unwrap();
        store.create(patch(json!({ "full name": "John Smith" })), now).unwrap();

        let renamed = store
            .edit("Jane Doe", patch(json!({ "full name": "Janet Doe" })), now.date())
            .unwrap();
        assert_eq!(renamed.full_name.as_deref(), Some("Janet Doe"));

        let interns = store.list(None).unwrap();
        let names: Vec<&str> = interns.keys().map(String::as_str).collect();
        assert_eq!(names, ["John Smith", "Janet Doe"]);
        assert_eq!(interns["Janet Doe"].logs.len(), 1);
        assert_eq!(interns["Janet Doe"].logs[0].time_in.as_deref(), Some("08:00 am"));
    }

    #[test]
    fn rename_onto_existing_name_changes_nothing() {
        let (_dir, store) = store();
        let now = at("2024-03-04", "08:00");
        store.create(patch(json!({ "full name": "Jane Doe" })), now).unwrap();
        store.create(patch(json!({ "full name": "John Smith" })), now).unwrap();
        let before = on_disk(&store);

        let result = store.edit(
            "Jane Doe",
            patch(json!({ "full name": "John Smith", "status": "Time-Out", "timeOut": "05:00 pm" })),
            now.date(),
        );

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(on_disk(&store), before);
    }

    #[test]
    fn edit_of_unknown_name_is_not_found() {
        let (_dir, store) = store();
        let result = store.edit("Nobody", patch(json!({})), day("2024-03-04"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_twice_is_not_found() {
        let (_dir, store) = store();
        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"))
            .unwrap();

        store.delete("Jane Doe").unwrap();
        assert!(matches!(store.delete("Jane Doe"), Err(StoreError::NotFound(_))));
        assert_eq!(on_disk(&store), json!({}));
    }

    #[test]
    fn list_filters_by_name() {
        let (_dir, store) = store();
        let now = at("2024-03-04", "08:00");
        store.create(patch(json!({ "full name": "Jane Doe" })), now).unwrap();
        store.create(patch(json!({ "full name": "John Smith" })), now).unwrap();

        let found = store.list(Some("DOE")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("Jane Doe"));
        assert_eq!(store.list(Some("  ")).unwrap().len(), 2);
    }

    #[test]
    fn summary_counts_statuses() {
        let (_dir, store) = store();
        let now = at("2024-03-04", "08:00");
        store.create(patch(json!({ "full name": "Jane Doe" })), now).unwrap();
        store.create(patch(json!({ "full name": "John Smith" })), now).unwrap();
        store
            .edit(
                "John Smith",
                patch(json!({ "status": "Time-Out", "timeOut": "10:30 am" })),
                now.date(),
            )
            .unwrap();

        assert_eq!(store.summary().unwrap(), ActivitySummary {
            total: 2,
            timed_in: 1,
            timed_out: 1,
            total_hours: 2.5,
        });
    }

    #[test]
    fn malformed_fields_do_not_fail_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interns.json");
        fs::write(
            &path,
            serde_json::to_string(&json!({
                "Jane Doe": {
                    "full name": "Jane Doe",
                    "honorifics": null,
                    "suffix": null,
                    "totalHours": null,
                    "logs": [{ "date": "2024-01-01", "timeIn": "bad", "timeOut": "05:00 pm" }]
                },
                "John Smith": {
                    "full name": "John Smith",
                    "totalHours": 0,
                    "logs": [{ "date": "2024-01-01", "timeIn": "09:00 am", "timeOut": "12:00 pm" }]
                },
                "Guest": { "full name": "Guest", "logs": "none" }
            }))
            .unwrap(),
        )
        .unwrap();
        let store = init_store(&path).unwrap();

        let interns = store.list(None).unwrap();
        assert_eq!(interns.len(), 3);
        assert_eq!(interns["Jane Doe"].total_hours, 0.0);
        assert!(interns["Guest"].logs.is_empty());

        let report = store.hours("John Smith", 486.0).unwrap();
        assert_eq!(report.total_hours, 3.0);
        assert_eq!(store.summary().unwrap().total, 3);
        store
            .edit("Jane Doe", patch(json!({ "suffix": "Jr." })), day("2024-01-02"))
            .unwrap();
    }

    #[test]
    fn untouched_records_keep_their_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interns.json");
        let sparse = json!({
            "totalHours": 0.0,
            "logs": [{ "date": "2024-01-01" }],
            "badge": 7
        });
        fs::write(&path, serde_json::to_string(&json!({ "Walk In": sparse })).unwrap()).unwrap();
        let store = init_store(&path).unwrap();

        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"))
            .unwrap();
        store
            .edit("Jane Doe", patch(json!({ "status": "Time-Out" })), day("2024-03-04"))
            .unwrap();

        assert_eq!(on_disk(&store)["Walk In"], sparse);
    }

    #[test]
    fn unknown_attributes_survive_edit_and_rename() {
        let (_dir, store) = store();
        let today = day("2024-03-04");
        store
            .create(
                patch(json!({ "full name": "Jane Doe", "id number": "A-17" })),
                at("2024-03-04", "08:00"),
            )
            .unwrap();

        store
            .edit(
                "Jane Doe",
                patch(json!({ "status": "Time-Out", "timeOut": "05:00 pm" })),
                today,
            )
            .unwrap();
        store
            .edit("Jane Doe", patch(json!({ "full name": "Janet Doe" })), today)
            .unwrap();

        let document = on_disk(&store);
        assert!(document.get("Jane Doe").is_none());
        assert_eq!(document["Janet Doe"]["id number"], json!("A-17"));
        assert_eq!(document["Janet Doe"]["status"], json!("Time-Out"));
    }

    #[test]
    fn concurrent_edits_are_not_lost() {
        const WRITERS: usize = 16;

        let (_dir, store) = store();
        let today = day("2024-03-04");
        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"))
            .unwrap();

        std::thread::scope(|scope| {
            for i in 0..WRITERS {
                let store = &store;
                scope.spawn(move || {
                    let mut body = serde_json::Map::new();
                    body.insert(format!("badge_{i}"), json!(i));
                    store.edit("Jane Doe", patch(Value::Object(body)), today).unwrap();
                });
            }
        });

        let jane = &on_disk(&store)["Jane Doe"];
        for i in 0..WRITERS {
            assert_eq!(jane[format!("badge_{i}")], json!(i), "badge_{i} was lost");
        }
    }

    #[test]
    fn remaining_hours_are_not_rounded() {
        let (_dir, store) = store();
        let today = day("2024-03-04");
        store
            .create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"))
            .unwrap();
        store
            .edit(
                "Jane Doe",
                patch(json!({ "status": "Time-Out", "timeOut": "08:20 am" })),
                today,
            )
            .unwrap();

        let report = store.hours("Jane Doe", 486.0).unwrap();
        assert_eq!(report.total_hours, 0.33);
        assert_eq!(report.remaining_hours, 486.0 - 20.0 / 60.0);
    }

    #[test]
    fn corrupt_document_is_a_storage_error() {
        let (_dir, store) = store();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.list(None), Err(StoreError::Storage(_))));
        let result = store.create(patch(json!({ "full name": "Jane Doe" })), at("2024-03-04", "08:00"));
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }
}

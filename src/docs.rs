use crate::db::{ActivitySummary, HoursReport};
use crate::model::attendance::{AttendanceStatus, LogEntry};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Kiosk API",
        version = "0.1.0",
        description = r#"
## Intern & Guest Attendance Kiosk

Local service behind the check-in kiosk pages. Records live in a single JSON
document keyed by full name.

### 🔹 Key Features
- **Check-in / check-out**
  - First check-in creates the record, later ones toggle `Time-In` / `Time-Out`
- **Hours**
  - Worked hours per day are capped at 8, overnight shifts roll into the next day
  - Remaining hours against the program quota
- **Admin**
  - Search by name, office activity summary

### 📦 Response Format
- JSON bodies, failures as `{ "error": "..." }`
"#,
    ),
    paths(
        crate::api::attendance::list_interns,
        crate::api::attendance::create_intern,
        crate::api::attendance::edit_intern,
        crate::api::attendance::delete_intern,

        crate::api::hours::intern_hours,
        crate::api::hours::activity_summary
    ),
    components(
        schemas(
            AttendanceStatus,
            LogEntry,
            HoursReport,
            ActivitySummary
        )
    ),
    tags(
        (name = "Attendance", description = "Intern/guest records and check-in"),
        (name = "Hours", description = "Worked hours and activity"),
    )
)]
pub struct ApiDoc;

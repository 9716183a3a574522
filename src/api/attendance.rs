use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use utoipa::IntoParams;

use crate::api::with_store;
use crate::db::AttendanceStore;
use crate::model::patch::RecordPatch;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InternQuery {
    /// Case-insensitive part of a full name
    pub search: Option<String>,
}

/// List every intern/guest with freshly computed hours
#[utoipa::path(
    get,
    path = "/api/internList",
    params(InternQuery),
    responses(
        (status = 200, description = "Map of full name to attendance record", body = Object, example = json!({
            "Jane Doe": {
                "honorifics": "Ms.",
                "full name": "Jane Doe",
                "suffix": "",
                "email": "jane@example.com",
                "status": "Time-Out",
                "logs": [{ "date": "2024-01-01", "timeIn": "08:00 am", "timeOut": "05:00 pm" }],
                "totalHours": 8.0
            }
        })),
        (status = 500, description = "Attendance file unreadable", body = Object, example = json!({
            "error": "Failed to read file"
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_interns(
    store: web::Data<AttendanceStore>,
    query: web::Query<InternQuery>,
) -> actix_web::Result<impl Responder> {
    let search = query.into_inner().search;
    debug!(search = ?search, "Listing interns");

    let interns = with_store(&store, move |s| s.list(search.as_deref())).await?;

    Ok(HttpResponse::Ok().json(interns))
}

/// First check-in of a new intern/guest
#[utoipa::path(
    post,
    path = "/api/internList",
    request_body(content = Object, description = "Record attributes, `full name` required", example = json!({
        "honorifics": "Ms.",
        "full name": "Jane Doe",
        "suffix": "",
        "email": "jane@example.com",
        "address": "Main St."
    })),
    responses(
        (status = 201, description = "Checked in", body = Object, example = json!({
            "message": "Intern 'Jane Doe' added",
            "data": {
                "full name": "Jane Doe",
                "status": "Time-In",
                "logs": [{ "date": "2024-01-01", "timeIn": "08:00 am", "timeOut": "" }],
                "totalHours": 0.0
            }
        })),
        (status = 400, description = "Missing full name", body = Object, example = json!({
            "error": "Missing full name in data"
        })),
        (status = 409, description = "Name already exists", body = Object, example = json!({
            "error": "Intern 'Jane Doe' already exists. Use PATCH to edit."
        })),
        (status = 500, description = "Attendance file unreadable or unwritable")
    ),
    tag = "Attendance"
)]
pub async fn create_intern(
    store: web::Data<AttendanceStore>,
    payload: web::Json<RecordPatch>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();
    let record = with_store(&store, move |s| s.create(payload.into_inner(), now)).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!("Intern '{}' added", record.full_name.as_deref().unwrap_or_default()),
        "data": record
    })))
}

/// Edit, check in/out or rename an intern/guest
#[utoipa::path(
    patch,
    path = "/editIntern/{name}",
    params(
        ("name", Path, description = "Current full name, URL-encoded")
    ),
    request_body(content = Object, description = "Attributes to change; `timeIn`/`timeOut` apply to today's log with the matching `status`", example = json!({
        "status": "Time-Out",
        "timeOut": "05:00 pm"
    })),
    responses(
        (status = 200, description = "Record updated", body = Object, example = json!({
            "message": "Updated 'Jane Doe'",
            "data": {
                "full name": "Jane Doe",
                "status": "Time-Out",
                "logs": [{ "date": "2024-01-01", "timeIn": "08:00 am", "timeOut": "05:00 pm" }],
                "totalHours": 8.0
            }
        })),
        (status = 404, description = "Intern not found", body = Object, example = json!({
            "error": "Intern 'Jane Doe' not found"
        })),
        (status = 409, description = "New name already taken", body = Object, example = json!({
            "error": "Intern 'John Smith' already exists"
        })),
        (status = 500, description = "Attendance file unreadable or unwritable")
    ),
    tag = "Attendance"
)]
pub async fn edit_intern(
    store: web::Data<AttendanceStore>,
    path: web::Path<String>,
    payload: web::Json<RecordPatch>,
) -> actix_web::Result<impl Responder> {
    let name = path.into_inner();
    let message = format!("Updated '{}'", name.trim());
    let today = Local::now().date_naive();

    let record = with_store(&store, move |s| s.edit(&name, payload.into_inner(), today)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "data": record
    })))
}

/// Delete an intern/guest
#[utoipa::path(
    delete,
    path = "/deleteIntern/{name}",
    params(
        ("name", Path, description = "Full name, URL-encoded")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Intern Jane Doe deleted successfully"
        })),
        (status = 404, description = "Intern not found", body = Object, example = json!({
            "error": "Intern 'Jane Doe' not found"
        })),
        (status = 500, description = "Attendance file unreadable or unwritable")
    ),
    tag = "Attendance"
)]
pub async fn delete_intern(
    store: web::Data<AttendanceStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let name = path.into_inner();
    let message = format!("Intern {} deleted successfully", name);

    with_store(&store, move |s| s.delete(&name)).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

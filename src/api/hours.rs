use actix_web::{HttpResponse, Responder, web};

use crate::api::with_store;
use crate::config::Config;
use crate::db::{ActivitySummary, AttendanceStore, HoursReport};

/// Worked and remaining hours of one intern
#[utoipa::path(
    get,
    path = "/api/hours/{name}",
    params(
        ("name", Path, description = "Full name, URL-encoded")
    ),
    responses(
        (status = 200, description = "Hours report", body = HoursReport),
        (status = 404, description = "Intern not found", body = Object, example = json!({
            "error": "Intern 'Jane Doe' not found"
        })),
        (status = 500, description = "Attendance file unreadable")
    ),
    tag = "Hours"
)]
pub async fn intern_hours(
    store: web::Data<AttendanceStore>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let name = path.into_inner();
    let quota = config.total_intern_hours;

    let report = with_store(&store, move |s| s.hours(&name, quota)).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Who is in, who is out, and the hours rendered so far
#[utoipa::path(
    get,
    path = "/api/summary",
    responses(
        (status = 200, description = "Office activity", body = ActivitySummary),
        (status = 500, description = "Attendance file unreadable")
    ),
    tag = "Hours"
)]
pub async fn activity_summary(
    store: web::Data<AttendanceStore>,
) -> actix_web::Result<impl Responder> {
    let summary = with_store(&store, |s| s.summary()).await?;

    Ok(HttpResponse::Ok().json(summary))
}

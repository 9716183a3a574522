pub mod attendance;
pub mod hours;

use actix_web::{Responder, get, web};

use crate::db::AttendanceStore;
use crate::error::StoreError;

#[get("/")]
pub async fn index() -> impl Responder {
    "Hello World!"
}

/// Runs a store operation on the blocking pool; store calls do file I/O.
pub(crate) async fn with_store<T, F>(
    store: &web::Data<AttendanceStore>,
    op: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&AttendanceStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    web::block(move || op(&store))
        .await
        .map_err(|e| StoreError::storage("Attendance store unavailable", e))?
}

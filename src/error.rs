use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure of a store operation. The display text is what the caller sees.
#[derive(Debug, Display)]
pub enum StoreError {
    /// Target record is absent.
    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Name already taken by another record.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Required identity field missing.
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// Document unreadable, unwritable or malformed. The cause is logged
    /// where it happens; only a generic message is kept here.
    #[display(fmt = "{}", _0)]
    Storage(String),
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound(format!("Intern '{}' not found", name))
    }

    pub fn storage(message: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{}", message);
        Self::Storage(message.to_string())
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}

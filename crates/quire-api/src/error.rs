//! Mapping of domain errors to HTTP responses.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Internal(quire_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<quire_core::Error> for ApiError {
    fn from(err: quire_core::Error) -> Self {
        use quire_core::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::NoteNotFound(id) => ApiError::NotFound(format!("Note {} not found", id)),
            Error::TagNotFound(id) => ApiError::NotFound(format!("Tag {} not found", id)),
            Error::UserNotFound(id) => ApiError::NotFound(format!("User {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            err @ Error::TagInUse { .. } => ApiError::Conflict(err.to_string()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    let friendly = if msg.contains("idx_unique_tag_name") {
                        "A tag with this name already exists"
                    } else if msg.contains("idx_unique_user_email") {
                        "A user with this email already exists"
                    } else {
                        "Duplicate value"
                    };
                    return ApiError::Conflict(friendly.to_string());
                }
                ApiError::Internal(Error::Database(sqlx_err))
            }
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

use crate::models::PassStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Forbidden(String),
    /// Action attempted from a status that does not permit it.
    InvalidState(PassStatus),
    /// Scan before the validity window opens (minus the grace period).
    NotYetValid { valid_from: String },
    /// Unused pass scanned after the validity window closed.
    Expired { valid_to: String },
    /// Pass has completed its one exit/entry cycle.
    AlreadyUsed,
    Conflict(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InvalidState(status) => write!(f, "Pass status: {}", status),
            ApiError::NotYetValid { valid_from } => {
                write!(f, "Pass not yet valid (valid from {})", valid_from)
            }
            ApiError::Expired { valid_to } => write!(f, "Pass expired (valid to {})", valid_to),
            ApiError::AlreadyUsed => write!(f, "Pass already used for entry"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::InvalidState(pass_status) => (
                StatusCode::CONFLICT,
                json!({ "error": format!("Pass status: {}", pass_status), "status": pass_status }),
            ),
            ApiError::NotYetValid { valid_from } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Pass not yet valid", "valid_from": valid_from }),
            ),
            ApiError::Expired { valid_to } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Pass expired", "valid_to": valid_to }),
            ),
            ApiError::AlreadyUsed => (
                StatusCode::CONFLICT,
                json!({ "error": "Pass already used for entry" }),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violations
                let message = db_err.message();
                if message.contains("UNIQUE") || message.contains("unique") {
                    ApiError::Conflict("Unique constraint violation".to_string())
                } else {
                    ApiError::Internal(format!("Database error: {}", message))
                }
            }
            _ => ApiError::Internal("Internal server error".to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

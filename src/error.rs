// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    TokenExpired,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Only .tcx files can be uploaded")]
    InvalidFileType,

    #[error("Unreadable TCX file: {0}")]
    MalformedFile(String),

    /// Recoverable, expected condition: the same workout was already
    /// uploaded. Carries a user-facing detail message so the client can
    /// show a warning instead of a generic error.
    #[error("Duplicate activity: {0}")]
    DuplicateActivity(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::InvalidFileType => (
                StatusCode::BAD_REQUEST,
                "invalid_file_type",
                Some("Only .tcx files can be uploaded".to_string()),
            ),
            AppError::MalformedFile(msg) => {
                (StatusCode::BAD_REQUEST, "malformed_file", Some(msg.clone()))
            }
            AppError::DuplicateActivity(msg) => {
                (StatusCode::CONFLICT, "duplicate_activity", Some(msg.clone()))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_activity_maps_to_conflict() {
        let resp = AppError::DuplicateActivity("already uploaded".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::TokenExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_file_errors_map_to_bad_request() {
        assert_eq!(
            AppError::InvalidFileType.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MalformedFile("truncated".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}

//! Error types for the CMMS server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No change: {0}")]
    NoChange(String),

    /// Claim lost to another actor; carries the winner's identity so the
    /// caller can be told who holds the work order.
    #[error("Work order already claimed by {assignee}")]
    AlreadyClaimed {
        assignee: String,
        claimed_at: Option<DateTime<Utc>>,
    },

    /// Status change attempted by someone who is neither the owner nor a
    /// supervisor/admin.
    #[error("Not the owner of this work order")]
    NotOwner { assignee: Option<String> },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Stable error kind
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Current assignee, on claim conflicts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_by: Option<String>,
    /// When the current assignee claimed the work order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,
    /// Extra context for operator feedback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            taken_by: None,
            taken_at: None,
            info: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("authentication", msg),
            ),
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, ErrorResponse::new("forbidden", msg))
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg))
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation", msg),
            ),
            AppError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("conflict", msg))
            }
            AppError::InvalidState(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("invalid_state", msg),
            ),
            AppError::NoChange(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("no_change", msg))
            }
            AppError::AlreadyClaimed {
                assignee,
                claimed_at,
            } => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "already_claimed".to_string(),
                    message: format!("This work order is already taken by {}", assignee),
                    taken_by: Some(assignee),
                    taken_at: claimed_at,
                    info: None,
                },
            ),
            AppError::NotOwner { assignee } => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "not_owner".to_string(),
                    message: "You are not allowed to change the status of this work order"
                        .to_string(),
                    taken_by: None,
                    taken_at: None,
                    info: Some(match assignee {
                        Some(name) => format!("This work order is being handled by: {}", name),
                        None => "This work order is not assigned yet".to_string(),
                    }),
                },
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("database", "Database error".to_string()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", "Internal server error".to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

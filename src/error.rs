use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid refresh session")]
    InvalidSession,
    #[error("Refresh session expired")]
    SessionExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Callers never learn which auth check failed; every auth-related
        // variant collapses into the same unauthorized response.
        let (status, message) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::InvalidSession
            | Self::SessionExpired
            | Self::UserNotFound => {
                tracing::debug!(kind = %self, "Authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

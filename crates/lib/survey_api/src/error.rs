//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use survey_core::models::building::BuildingError;
use survey_core::models::wire::ErrorResponse;
use thiserror::Error;

use crate::services::signing::SigningError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Upstream(m) => (StatusCode::BAD_GATEWAY, "upstream_unavailable", m.as_str()),
            AppError::Unavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", m.as_str())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        if let AppError::Internal(detail) = &self {
            tracing::error!("internal error: {detail}");
        }
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<BuildingError> for AppError {
    fn from(e: BuildingError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<SigningError> for AppError {
    fn from(e: SigningError) -> Self {
        match e {
            SigningError::Invalid => AppError::Validation("Invalid or tampered QR code".into()),
            SigningError::Encode(msg) => AppError::Internal(msg),
        }
    }
}

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::shared::constants::{
    HEADER_RATE_LIMIT_LIMIT, HEADER_RATE_LIMIT_REMAINING, HEADER_RATE_LIMIT_RESET,
};
use crate::shared::types::ApiResponse;

/// Machine-readable code carried in `errors` of a quota rejection
pub const RATE_LIMIT_EXCEEDED_CODE: &str = "rate_limit_exceeded";

/// Machine-readable code carried in `errors` when the gate fails closed
pub const SERVICE_UNAVAILABLE_CODE: &str = "service_unavailable";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Rate limit exceeded for '{category}', resets at {reset_at}")]
    RateLimitExceeded {
        category: String,
        limit: u32,
        reset_at: DateTime<Utc>,
        retry_after_secs: u64,
    },

    /// The counter or identity store could not be reached; requests fail closed.
    #[error("Infrastructure unavailable: {0}")]
    InfrastructureUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();

        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::RateLimitExceeded {
                ref category,
                limit,
                reset_at,
                retry_after_secs,
            } => {
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                headers.insert(HEADER_RATE_LIMIT_LIMIT, HeaderValue::from(limit));
                headers.insert(HEADER_RATE_LIMIT_REMAINING, HeaderValue::from(0u32));
                headers.insert(
                    HEADER_RATE_LIMIT_RESET,
                    HeaderValue::from(reset_at.timestamp()),
                );
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!(
                        "Rate limit exceeded for {}. Try again in {} seconds",
                        category, retry_after_secs
                    ),
                    Some(vec![RATE_LIMIT_EXCEEDED_CODE.to_string()]),
                )
            }
            AppError::InfrastructureUnavailable(ref msg) => {
                tracing::error!("Infrastructure unavailable: {}", msg);
                headers.insert(RETRY_AFTER, HeaderValue::from(1u32));
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                    Some(vec![SERVICE_UNAVAILABLE_CODE.to_string()]),
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, headers, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

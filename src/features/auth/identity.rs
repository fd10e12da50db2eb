use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::model::AuthenticatedUser;
use crate::core::error::AppError;

/// Resolves a bearer token to the user it was issued for.
///
/// Fails with `Unauthorized` for bad tokens and `InfrastructureUnavailable`
/// when the auth provider cannot be reached.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AppError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

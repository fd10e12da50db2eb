use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::identity::IdentityResolver;
use super::jwks::{JwksClient, JwksError};
use super::model::{AppMetadataClaims, AuthenticatedUser};
use crate::core::error::AppError;

/// Algorithms the hosted auth provider signs with
const ALLOWED_ALGORITHMS: [Algorithm; 2] = [Algorithm::RS256, Algorithm::ES256];

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    /// Postgres role the token maps to; `anon` tokens carry no user
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadataClaims,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Missing kid in token header".to_string()))?;

        let decoding_key = self.jwks_client.get_key(&kid).await.map_err(|e| match e {
            // The key set itself could not be loaded: the identity store is down
            JwksError::FetchError(_) | JwksError::ParseError(_) => {
                AppError::InfrastructureUnavailable(e.to_string())
            }
            _ => AppError::Unauthorized(e.to_string()),
        })?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?
            .claims;

        claims_to_user(claims)
    }
}

fn claims_to_user(claims: Claims) -> Result<AuthenticatedUser, AppError> {
    if claims.role.as_deref() == Some("anon") {
        return Err(AppError::Unauthorized(
            "Anonymous tokens cannot access this resource".to_string(),
        ));
    }
    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized("Token has no subject".to_string()));
    }

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
        roles: claims.app_metadata.roles,
    })
}

#[async_trait]
impl IdentityResolver for JwtValidator {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        self.validate_token(token).await
    }
}

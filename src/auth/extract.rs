use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{auth::jwt::JwtKeys, error::AuthError, state::AppState};

/// Extracts and validates the bearer token, yielding the username it was
/// issued for. Any failure rejects the request with 401.
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::MissingToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token, state.clock.now()).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            e
        })?;

        Ok(AuthUser(claims.sub))
    }
}

use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, error::AuthError, state::AppState};

/// JWT payload. `sub` is the username the token was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Signing and verification keys plus the validity window, derived from the
/// process-wide JWT config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Sign a token for `username`, valid from `now` for the configured
    /// window. `now` comes from the caller's clock, not the wall clock.
    pub fn issue(&self, username: &str, now: OffsetDateTime) -> Result<String, AuthError> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: username.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(e.into()))?;
        debug!(username = %username, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Check signature, issuer and audience, then expiry against the
    /// injected `now`. Pure given the key and `now`.
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // expiry is checked below against the injected clock
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidSignature)?;
        if now.unix_timestamp() >= data.claims.exp as i64 {
            return Err(AuthError::Expired);
        }
        debug!(username = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use time::macros::datetime;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn make_keys_with_secret(secret: &str) -> JwtKeys {
        let mut config = AppState::fake_config();
        config.jwt.secret = secret.into();
        let state = AppState::from_parts(
            std::sync::Arc::new(crate::store::MemoryStore::new()),
            std::sync::Arc::new(crate::clock::SystemClock),
            std::sync::Arc::new(config),
        );
        JwtKeys::from_ref(&state)
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys();
        let now = datetime!(2025-01-01 00:00 UTC);
        let token = keys.issue("alice", now).expect("issue");
        let claims = keys.verify(&token, now).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp, claims.iat + 30 * 60);
    }

    #[test]
    fn verify_just_before_expiry_succeeds() {
        let keys = make_keys();
        let issued = datetime!(2025-01-01 00:00 UTC);
        let token = keys.issue("alice", issued).expect("issue");
        let almost = issued + TimeDuration::minutes(30) - TimeDuration::seconds(1);
        assert!(keys.verify(&token, almost).is_ok());
    }

    #[test]
    fn verify_after_window_is_expired() {
        let keys = make_keys();
        let issued = datetime!(2025-01-01 00:00 UTC);
        let token = keys.issue("alice", issued).expect("issue");
        let later = issued + TimeDuration::minutes(31);
        let err = keys.verify(&token, later).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn verify_with_other_key_is_invalid_signature() {
        let keys = make_keys();
        let other = make_keys_with_secret("a-different-secret");
        let now = datetime!(2025-01-01 00:00 UTC);
        let token = keys.issue("alice", now).expect("issue");
        let err = other.verify(&token, now).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        let err = keys
            .verify("not.a.jwt", datetime!(2025-01-01 00:00 UTC))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }
}

//! Session token service.
//!
//! HS256 bearer tokens. The signing secret is injected at construction
//! from configuration; nothing in here reads the environment.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use platform_core::error::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id).
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Why verification failed. Callers fold this into a generic
/// authentication failure before anything reaches the wire.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expiry_days: i64,
}

impl TokenService {
    pub fn new(secret: &str, session_expiry_days: i64) -> Result<Self, AppError> {
        if secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secret must be at least 32 bytes"
            )));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_expiry_days,
        })
    }

    /// Issue a session token for a user. Fixed validity window; the
    /// platform default is 7 days.
    pub fn issue_session_token(&self, user_id: &str, email: &str) -> Result<String, AppError> {
        self.issue_at(user_id, email, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + Duration::days(self.session_expiry_days)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a session token: signature plus expiry, no leeway.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(TokenError::Expired),
            Err(e) => Err(TokenError::Invalid(e)),
        }
    }

    pub fn session_expiry_seconds(&self) -> i64 {
        self.session_expiry_days * 24 * 60 * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret!";

    fn service() -> TokenService {
        TokenService::new(SECRET, 7).unwrap()
    }

    #[test]
    fn rejects_short_secret() {
        assert!(TokenService::new("short", 7).is_err());
    }

    #[test]
    fn issues_and_verifies_round_trip() {
        let svc = service();
        let token = svc.issue_session_token("user-1", "a@example.com").unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_distinct_from_invalid() {
        let svc = service();
        let token = svc
            .issue_at("user-1", "a@example.com", Utc::now() - Duration::days(8))
            .unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let svc = service();
        assert!(matches!(
            svc.verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let token = service()
            .issue_session_token("user-1", "a@example.com")
            .unwrap();
        let other = TokenService::new("another-secret-another-secret-xx", 7).unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }
}

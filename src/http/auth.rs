//! JWT verification for routes and sockets.

use std::str::FromStr;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    Missing,

    #[error("Invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Verifies bearer tokens against the configured shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(algorithm),
        }
    }

    /// Build a verifier when `auth.key` is set.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let secret = config.key.as_deref()?;
        let algorithm = Algorithm::from_str(&config.algorithm).unwrap_or(Algorithm::HS256);
        Some(Self::new(secret, algorithm))
    }

    /// Decode and validate a token, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Value, AuthError> {
        decode::<Value>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::Invalid)
    }

    /// Verify the `Authorization: Bearer` header.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<Value, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Missing)?;
        self.verify(token)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(secret: &str, exp_offset: i64) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        encode(
            &Header::default(),
            &json!({"sub": "ada", "exp": now + exp_offset}),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_token() {
        let verifier = TokenVerifier::new("secret", Algorithm::HS256);
        let claims = verifier.verify(&token("secret", 600)).unwrap();
        assert_eq!(claims["sub"], "ada");

        assert!(matches!(verifier.verify(&token("other", 600)), Err(AuthError::Invalid(_))));
        assert!(matches!(verifier.verify(&token("secret", -600)), Err(AuthError::Invalid(_))));
        assert!(matches!(verifier.verify("garbage"), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_bearer_header() {
        let verifier = TokenVerifier::new("secret", Algorithm::HS256);
        let mut headers = HeaderMap::new();
        assert!(matches!(verifier.verify_headers(&headers), Err(AuthError::Missing)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(verifier.verify_headers(&headers), Err(AuthError::Missing)));

        let value = format!("Bearer {}", token("secret", 600));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        assert!(verifier.verify_headers(&headers).is_ok());
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(TokenVerifier::from_config(&AuthConfig::default()).is_none());

        let config = AuthConfig {
            key: Some("secret".into()),
            ..AuthConfig::default()
        };
        assert!(TokenVerifier::from_config(&config).is_some());
    }
}

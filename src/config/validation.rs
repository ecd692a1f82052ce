//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that auth options are usable where they are required
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::fmt;

use crate::config::schema::Settings;
use crate::routing::check_path;

/// A single semantic problem with the settings object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const HMAC_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if settings.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if settings.server.body_limit_bytes == 0 {
        errors.push(ValidationError::new("server.body_limit_bytes", "must be greater than 0"));
    }

    if !HMAC_ALGORITHMS.contains(&settings.auth.algorithm.as_str()) {
        errors.push(ValidationError::new(
            "auth.algorithm",
            format!("unsupported algorithm {:?}, expected one of {:?}", settings.auth.algorithm, HMAC_ALGORITHMS),
        ));
    }
    if matches!(settings.auth.key.as_deref(), Some(key) if key.is_empty()) {
        errors.push(ValidationError::new("auth.key", "must not be empty"));
    }

    if let Err(reason) = check_path(&settings.sockets.path) {
        errors.push(ValidationError::new("sockets.path", reason));
    }
    if settings.sockets.auth {
        if settings.auth.key.is_none() {
            errors.push(ValidationError::new("auth.key", "required when sockets.auth is enabled"));
        }
        if settings.sockets.auth_timeout_ms == 0 {
            errors.push(ValidationError::new("sockets.auth_timeout_ms", "must be greater than 0"));
        }
    }

    if settings.observability.metrics_enabled
        && settings.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "must be a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = Settings::default();
        settings.server.request_timeout_secs = 0;
        settings.auth.algorithm = "RS256".into();
        settings.sockets.auth = true;

        let errors = validate_settings(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["server.request_timeout_secs", "auth.algorithm", "auth.key"]);
    }

    #[test]
    fn test_socket_auth_with_key_is_valid() {
        let mut settings = Settings::default();
        settings.sockets.auth = true;
        settings.auth.key = Some("secret".into());
        assert!(validate_settings(&settings).is_ok());
    }
    #[test]
    fn test_socket_path_syntax() {
        let mut settings = Settings::default();
        settings.sockets.path = "/socket/:room".into();

        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sockets.path");
    }
}

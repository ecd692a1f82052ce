//! Response helpers and the default responder.
//!
//! # Responsibilities
//! - Build the standard error envelope `{ statusCode, error, message }`
//! - Translate a controller result into an HTTP response
//!
//! # Design Decisions
//! - Success is always 200 with the result as JSON body
//! - An empty result is 404, an action error is 400
//! - `error` is the canonical reason phrase of the status code

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::validation::ValidationFailure;
use crate::registry::ControllerResult;

/// Details attached to a 400 caused by request validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    pub source: String,
    pub keys: Vec<String>,
}

/// Standard error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub error: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDetails>,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.into(),
            validation: None,
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Error response with the standard envelope.
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    ErrorEnvelope::new(status, message).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    error(StatusCode::BAD_REQUEST, message)
}

pub fn unauthorized(message: impl Into<String>) -> Response {
    error(StatusCode::UNAUTHORIZED, message)
}

pub fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not Found")
}

/// 400 for a request that failed its route's validation rules.
pub fn validation_failed(failure: &ValidationFailure) -> Response {
    let mut envelope = ErrorEnvelope::new(StatusCode::BAD_REQUEST, failure.message.clone());
    envelope.validation = Some(ValidationDetails {
        source: failure.source.as_str().to_string(),
        keys: vec![failure.key.clone()],
    });
    envelope.into_response()
}

/// Empty body with the given status.
pub fn empty(status: StatusCode) -> Response {
    status.into_response()
}

/// Translate a controller result: 200 with the result, 404 when empty,
/// 400 with the error envelope on failure.
pub fn respond(result: ControllerResult) -> Response {
    match result {
        Ok(Some(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            tracing::debug!(error = %e, "Action failed");
            bad_request(e.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use serde_json::json;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_respond_success() {
        let response = respond(Ok(Some(json!("simpleResponse"))));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!("simpleResponse"));
    }

    #[tokio::test]
    async fn test_respond_error_envelope() {
        let response = respond(Err(ActionError::from("defaultResponderError")));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"statusCode": 400, "error": "Bad Request", "message": "defaultResponderError"})
        );
    }

    #[tokio::test]
    async fn test_respond_not_found() {
        let response = respond(Ok(None));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not Found");
    }
}

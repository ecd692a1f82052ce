//! Request context handed to handler functions.
//!
//! # Responsibilities
//! - Collect path params, query params and JSON payload
//! - Carry verified claims and the application context
//!
//! # Design Decisions
//! - The body is read once, up to the configured limit
//! - An empty body is "no payload"; a non-JSON body is a client error

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, Query, RawPathParams};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::AppContext;

/// Why a request could not be turned into a [`RequestContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    BodyTooLarge,
    InvalidJson,
    InvalidQuery,
}

impl ExtractError {
    pub fn message(&self) -> &'static str {
        match self {
            ExtractError::BodyTooLarge => "Payload content length greater than maximum allowed",
            ExtractError::InvalidJson => "Invalid request payload JSON format",
            ExtractError::InvalidQuery => "Invalid request query string",
        }
    }
}

/// An incoming request as seen by a handler function.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub payload: Option<Value>,

    /// Verified JWT claims on routes that require auth.
    pub claims: Option<Value>,

    pub remote_addr: Option<SocketAddr>,
    app: AppContext,
}

impl RequestContext {
    /// Split an axum request into a context. Claims are attached later.
    pub(crate) async fn from_request(
        request: Request<Body>,
        app: AppContext,
        body_limit: usize,
    ) -> Result<Self, ExtractError> {
        let (mut parts, body) = request.into_parts();

        let params = path_params(&mut parts).await;
        let query = match parts.uri.query() {
            Some(_) => Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .map(|Query(query)| query)
                .map_err(|_| ExtractError::InvalidQuery)?,
            None => HashMap::new(),
        };

        let bytes = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|_| ExtractError::BodyTooLarge)?;
        let payload = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(&bytes).map_err(|_| ExtractError::InvalidJson)?)
        };

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params,
            query,
            headers: parts.headers,
            payload,
            claims: None,
            remote_addr,
            app,
        })
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Deserialize the JSON payload (`null` when there is none).
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone().unwrap_or(Value::Null))
    }

    /// Request id set by the request-id layer.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
    }
}

async fn path_params(parts: &mut Parts) -> HashMap<String, String> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

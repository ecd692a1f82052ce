//! Configuration schema definitions.
//!
//! This module defines the settings object read from `config/settings.toml`
//! and the per-environment database configuration read from
//! `config/database.toml`. All types derive Serde traits; every section has
//! defaults so a missing file or a partial file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Runtime mode, selected from `APP_ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
    Other(String),
}

impl Environment {
    /// Environment variable holding the runtime mode.
    pub const VAR: &'static str = "APP_ENV";

    /// Read the runtime mode from the process environment.
    pub fn from_env() -> Self {
        std::env::var(Self::VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// Parse a mode name. Unknown names are kept verbatim.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            other => Environment::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Other(name) => name,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root settings object.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Listener and request handling options.
    pub server: ServerConfig,

    /// JWT authentication options.
    pub auth: AuthConfig,

    /// Mail transporter options.
    pub mail: MailConfig,

    /// Real-time socket layer options.
    pub sockets: SocketConfig,

    /// Logging and metrics options.
    pub observability: ObservabilityConfig,

    /// Free-form options for application plugins.
    pub plugins: BTreeMap<String, toml::Value>,
}

impl Settings {
    /// Address the server binds to (`host:port`).
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Options for a named plugin, if any were configured.
    pub fn plugin(&self, name: &str) -> Option<&toml::Value> {
        self.plugins.get(name)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host. Defaults to `IP` from the environment, else `0.0.0.0`.
    pub host: String,

    /// Bind port. Defaults to `PORT` from the environment, else `8080`.
    pub port: u16,

    /// Total time allowed for a request in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("IP").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(8080),
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to verify tokens.
    pub key: Option<String>,

    /// Signing algorithm (HS256, HS384, HS512).
    pub algorithm: String,

    /// Whether routes that do not state `auth` require authentication.
    pub default_required: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key: None,
            algorithm: "HS256".to_string(),
            default_required: false,
        }
    }
}

/// Mail transport kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Render each message as JSON and log it.
    #[default]
    Json,
    /// Reject every message.
    Disabled,
}

/// Mail transporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: TransportKind,

    /// Sender used when a message does not set one.
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Json,
            from: "no-reply@localhost".to_string(),
        }
    }
}

/// Socket layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Mount the websocket endpoint.
    pub enabled: bool,

    /// Websocket endpoint path.
    pub path: String,

    /// Require a JWT before plugins run.
    pub auth: bool,

    /// Time allowed for the `authenticate` event in milliseconds.
    pub auth_timeout_ms: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/socket".to_string(),
            auth: false,
            auth_timeout_ms: 15_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Connection options for the model layer, one table per environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dialect: String,
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: "sqlite".to_string(),
            host: "localhost".to_string(),
            port: None,
            database: "mentat".to_string(),
            username: None,
            password: None,
        }
    }
}

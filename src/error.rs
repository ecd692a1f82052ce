//! Error types shared across the bootstrapper.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by a controller action or a server method.
///
/// The default responder turns it into a 400 response carrying `message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Fatal error during the startup sequence.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error scanning {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("route file {} refers to unknown handler {handler}", .path.display())]
    UnknownHandlerFile { path: PathBuf, handler: String },

    #[error("route {method} {path} refers to unknown handler {handler}")]
    UnknownHandler {
        method: String,
        path: String,
        handler: String,
    },

    #[error("route {method} {path} refers to unknown function {handler}.{function}")]
    UnknownFunction {
        method: String,
        path: String,
        handler: String,
        function: String,
    },

    #[error("route {method} {path} refers to unknown validator {validator}")]
    UnknownValidator {
        method: String,
        path: String,
        validator: String,
    },

    #[error("invalid route {method} {path}: {reason}")]
    InvalidRoute {
        method: String,
        path: String,
        reason: String,
    },

    #[error("duplicate route {method} {path}")]
    DuplicateRoute { method: String, path: String },

    #[error("route {method} {path} requires auth but auth.key is not set")]
    MissingAuthKey { method: String, path: String },

    #[error("model {model} is associated with unknown model {target}")]
    UnknownAssociation { model: String, target: String },
}

/// Top-level error for running the application.
#[derive(Debug, Error)]
pub enum MentatError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

//! Configuration loading from disk.
//!
//! Every conventional file is optional: a missing file means "use defaults"
//! (or "nothing to load"), any other IO or parse error is fatal.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::schema::{DatabaseConfig, Environment, Settings};
use crate::config::validation::{validate_settings, ValidationError};
use crate::http::validation::ValidationRules;
use crate::routing::ConfiguredRoute;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Conventional file locations under the application root.
#[derive(Debug, Clone)]
pub struct AppLayout {
    root: PathBuf,
}

impl AppLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("config").join("settings.toml")
    }

    pub fn database_file(&self) -> PathBuf {
        self.root.join("config").join("database.toml")
    }

    pub fn routes_file(&self) -> PathBuf {
        self.root.join("config").join("routes.toml")
    }

    pub fn validator_file(&self) -> PathBuf {
        self.root.join("config").join("validator.toml")
    }

    pub fn handlers_dir(&self) -> PathBuf {
        self.root.join("handlers")
    }
}

impl Default for AppLayout {
    fn default() -> Self {
        Self::new("server")
    }
}

/// Read a file, treating "not found" as absent.
pub fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse an optional TOML file. Returns `None` when the file does not exist.
pub fn parse_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Load and validate the settings object, falling back to defaults.
pub fn load_settings(layout: &AppLayout) -> Result<Settings, ConfigError> {
    let path = layout.settings_file();
    let settings = match parse_optional::<Settings>(&path)? {
        Some(settings) => {
            tracing::info!(path = %path.display(), "Settings loaded");
            settings
        }
        None => {
            tracing::info!(path = %path.display(), "No settings file, using defaults");
            Settings::default()
        }
    };

    validate_settings(&settings).map_err(ConfigError::Validation)?;

    Ok(settings)
}

/// Load the database table for the given environment.
pub fn load_database(
    layout: &AppLayout,
    environment: &Environment,
) -> Result<DatabaseConfig, ConfigError> {
    let tables: HashMap<String, DatabaseConfig> =
        parse_optional(&layout.database_file())?.unwrap_or_default();

    Ok(tables
        .get(environment.as_str())
        .cloned()
        .unwrap_or_default())
}

/// Load named request-validation rule sets.
pub fn load_validators(layout: &AppLayout) -> Result<HashMap<String, ValidationRules>, ConfigError> {
    Ok(parse_optional(&layout.validator_file())?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct RoutesFile {
    #[serde(default)]
    routes: Vec<ConfiguredRoute>,
}

/// Load extra routes declared outside of handlers.
pub fn load_routes(layout: &AppLayout) -> Result<Vec<ConfiguredRoute>, ConfigError> {
    Ok(parse_optional::<RoutesFile>(&layout.routes_file())?
        .unwrap_or_default()
        .routes)
}

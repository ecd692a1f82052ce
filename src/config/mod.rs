//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! <root>/config/settings.toml (optional)
//!     → loader.rs (parse & deserialize, defaults for missing file)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → shared via Arc through AppContext
//!
//! <root>/config/database.toml   → DatabaseConfig for the current Environment
//! <root>/config/validator.toml  → named ValidationRules
//! <root>/config/routes.toml     → extra ConfiguredRoute entries
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Only "file not found" is tolerated; every other error aborts startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{AppLayout, ConfigError};
pub use schema::{
    AuthConfig, DatabaseConfig, Environment, MailConfig, ObservabilityConfig, ServerConfig,
    Settings, SocketConfig, TransportKind,
};

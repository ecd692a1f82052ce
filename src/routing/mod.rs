//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Handler.routes (code + <root>/handlers/<Name>.*.toml)
//! <root>/config/routes.toml
//!     → route.rs (RouteSpec / ConfiguredRoute declarations)
//!     → router.rs (resolve handler, function, validator, auth)
//!     → RouteTable (frozen, mounted by http::server)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Path parameters use `{name}` segments, matched by axum
//! - Deterministic: same inputs always produce the same table

pub mod route;
pub mod router;

pub use route::{check_path, parse_method, ConfiguredRoute, RouteSpec, ValidateSpec};
pub use router::{RouteEntry, RouteTable};

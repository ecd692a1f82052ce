//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum router, middleware, route per declared path)
//!     → auth.rs (bearer JWT on routes that require it)
//!     → request.rs (params, query, JSON payload)
//!     → validation.rs (route rules)
//!     → handler function
//!     → response.rs (default responder, error envelope)
//!     → Send to client
//! ```

pub mod auth;
pub mod request;
pub mod response;
pub mod server;
pub mod validation;

pub use request::RequestContext;
pub use response::{respond, ErrorEnvelope};
pub use server::HttpServer;
pub use validation::{FieldRule, FieldType, ValidationRules};

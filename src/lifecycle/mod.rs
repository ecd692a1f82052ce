//! Application lifecycle.
//!
//! # Data Flow
//! ```text
//! MentatBuilder::load (startup.rs):
//!     settings → database + models → mail transporter → server methods
//!     → controllers → handlers + route files → route table
//!     → AppContext → router + socket endpoint
//!
//! Mentat::start (startup.rs):
//!     metrics exporter (optional) → bind host:port → serve
//!
//! Ctrl-C / SIGTERM (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → server stops accepting, in-flight requests finish
//! ```
//!
//! # Design Decisions
//! - Every startup error is fatal; missing optional files are not errors
//! - Nothing listens until every registry has loaded

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Mentat, MentatBuilder};

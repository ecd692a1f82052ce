//! Real-time socket layer.
//!
//! # Data Flow
//! ```text
//! Client ←──── JSON envelopes over websocket ────→ connection.rs
//!                                                     → plugin.rs (per-connection fan-out)
//!                                                     → socket.rs (listeners, emit)
//!                                                     → server.rs (live handles, broadcast)
//! ```
//!
//! # Design Decisions
//! - Plugins are registered explicitly and run for every connection
//! - No plugins is valid: connections are accepted and simply idle
//! - Authentication happens before any plugin sees the connection

pub(crate) mod connection;
pub mod plugin;
pub mod server;
pub mod socket;

pub use plugin::SocketPlugin;
pub use server::SocketServer;
pub use socket::{Envelope, Socket, SocketHandle};

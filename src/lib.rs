//! Mentat application server library.
//!
//! Applications register handlers, controllers, models, server methods and
//! socket plugins on a [`MentatBuilder`]; data files under the application
//! root (`config/*.toml`, `handlers/*.toml`) add settings, routes and
//! validation rules. [`MentatBuilder::load`] wires everything together and
//! [`Mentat::start`] serves HTTP and websocket traffic.

// Core subsystems
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod registry;
pub mod routing;
pub mod sockets;

// Services
pub mod mail;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{Environment, Settings};
pub use context::AppContext;
pub use error::{ActionError, BootstrapError, MentatError};
pub use http::{respond, RequestContext};
pub use lifecycle::{Mentat, MentatBuilder, Shutdown};
pub use mail::{Mail, Transporter};
pub use registry::{Association, Controller, ControllerResult, Handler, Model};
pub use routing::RouteSpec;
pub use sockets::{Socket, SocketHandle, SocketPlugin};

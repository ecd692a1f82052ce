//! Socket plugins: per-connection initializers.

use std::fmt;
use std::sync::Arc;

use crate::sockets::socket::Socket;

/// A named function run once for every new connection, typically to
/// register event listeners with [`Socket::on`].
#[derive(Clone)]
pub struct SocketPlugin {
    name: String,
    attach: Arc<dyn Fn(&mut Socket) + Send + Sync>,
}

impl SocketPlugin {
    /// A plugin that runs `attach` on every new connection.
    pub fn new<F>(name: impl Into<String>, attach: F) -> Self
    where
        F: Fn(&mut Socket) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            attach: Arc::new(attach),
        }
    }

    /// Name used in startup logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn attach(&self, socket: &mut Socket) {
        (self.attach)(socket);
        tracing::info!(socket_id = %socket.id(), module = %self.name, "socket [{}] loaded module: {}", socket.id(), self.name);
    }
}

impl fmt::Debug for SocketPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketPlugin").field("name", &self.name).finish()
    }
}

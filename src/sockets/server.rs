//! Registry of live connections (the application's "io" object).

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::observability::metrics;
use crate::sockets::socket::SocketHandle;

/// Connected sockets, shared by every request and connection.
#[derive(Clone, Default)]
pub struct SocketServer {
    sockets: Arc<DashMap<Uuid, SocketHandle>>,
}

impl SocketServer {
    /// An empty connection set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, handle: SocketHandle) {
        self.sockets.insert(handle.id(), handle);
        metrics::record_socket_count(self.sockets.len());
    }

    pub(crate) fn remove(&self, id: Uuid) {
        self.sockets.remove(&id);
        metrics::record_socket_count(self.sockets.len());
    }

    /// Handle for a live connection.
    pub fn get(&self, id: Uuid) -> Option<SocketHandle> {
        self.sockets.get(&id).map(|entry| entry.value().clone())
    }

    /// Ids of every live connection.
    pub fn ids(&self) -> Vec<Uuid> {
        self.sockets.iter().map(|entry| *entry.key()).collect()
    }

    /// Send an event to every connection. Returns how many accepted it.
    pub fn emit(&self, event: &str, data: Value) -> usize {
        self.sockets
            .iter()
            .filter(|entry| entry.value().emit(event, data.clone()))
            .count()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether no connection is live.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl std::fmt::Debug for SocketServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketServer").field("connected", &self.len()).finish()
    }
}

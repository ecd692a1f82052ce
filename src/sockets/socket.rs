//! Per-connection socket objects.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::context::AppContext;

/// Wire frame: every text message is `{ "event": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,

    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// An envelope carrying `data` under `event`.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Outbound {
    Text(String),
    Close,
}

/// Cloneable sending side of a connection.
#[derive(Clone)]
pub struct SocketHandle {
    id: Uuid,
    remote_addr: Option<SocketAddr>,
    claims: Option<Arc<Value>>,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SocketHandle {
    pub(crate) fn new(
        id: Uuid,
        remote_addr: Option<SocketAddr>,
        claims: Option<Value>,
        tx: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            id,
            remote_addr,
            claims: claims.map(Arc::new),
            tx,
        }
    }

    /// Connection id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Peer address, when known.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Verified JWT claims when socket auth is enabled.
    pub fn claims(&self) -> Option<&Value> {
        self.claims.as_deref()
    }

    /// Send an event to this connection. Returns false once it is gone.
    pub fn emit(&self, event: impl Into<String>, data: Value) -> bool {
        match serde_json::to_string(&Envelope::new(event, data)) {
            Ok(text) => self.tx.send(Outbound::Text(text)).is_ok(),
            Err(e) => {
                tracing::warn!(socket_id = %self.id, error = %e, "Failed to encode socket event");
                false
            }
        }
    }

    /// Close the connection after queued events are flushed.
    pub fn disconnect(&self) {
        let _ = self.tx.send(Outbound::Close);
    }

    /// Whether the connection is still open.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketHandle")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}

type Listener = Arc<dyn Fn(SocketHandle, Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// A connection as seen by socket plugins: its handle, the application
/// context and the event listeners plugins register on it.
pub struct Socket {
    handle: SocketHandle,
    app: AppContext,
    listeners: HashMap<String, Vec<Listener>>,
}

impl Socket {
    pub(crate) fn new(handle: SocketHandle, app: AppContext) -> Self {
        Self {
            handle,
            app,
            listeners: HashMap::new(),
        }
    }

    /// Connection id.
    pub fn id(&self) -> Uuid {
        self.handle.id
    }

    /// Handle that outlives the plugin call.
    pub fn handle(&self) -> &SocketHandle {
        &self.handle
    }

    /// Application context.
    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Token claims when socket auth is enabled.
    pub fn claims(&self) -> Option<&Value> {
        self.handle.claims()
    }

    /// Send an event to this connection only.
    pub fn emit(&self, event: impl Into<String>, data: Value) -> bool {
        self.handle.emit(event, data)
    }

    /// Register a listener for an incoming event. `disconnect` fires when the
    /// connection ends.
    pub fn on<F, Fut>(&mut self, event: impl Into<String>, f: F)
    where
        F: Fn(SocketHandle, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener: Listener = Arc::new(move |handle, data| Box::pin(f(handle, data)));
        self.listeners.entry(event.into()).or_default().push(listener);
    }

    /// Whether any listener is registered for `event`.
    pub fn listens_to(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    /// Run the listeners for an event in registration order.
    pub(crate) async fn dispatch(&self, event: &str, data: Value) -> usize {
        let Some(listeners) = self.listeners.get(event) else {
            tracing::debug!(socket_id = %self.id(), event = %event, "No listener for event");
            return 0;
        };

        for listener in listeners {
            listener(self.handle.clone(), data.clone()).await;
        }
        listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_dispatch_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(Uuid::new_v4(), None, None, tx);
        let mut socket = Socket::new(handle, AppContext::for_tests());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        socket.on("ping", move |handle, data| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                handle.emit("pong", data);
            }
        });
        socket.on("ping", |handle, _| async move {
            handle.emit("pong", json!("second"));
        });

        assert!(socket.listens_to("ping"));
        assert_eq!(socket.dispatch("ping", json!(1)).await, 2);
        assert_eq!(socket.dispatch("unknown", Value::Null).await, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let Some(Outbound::Text(first)) = rx.recv().await else { panic!("expected text") };
        assert_eq!(serde_json::from_str::<Envelope>(&first).unwrap(), Envelope::new("pong", json!(1)));
        let Some(Outbound::Text(second)) = rx.recv().await else { panic!("expected text") };
        assert_eq!(serde_json::from_str::<Envelope>(&second).unwrap().data, json!("second"));
    }

    #[test]
    fn test_emit_after_close() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(Uuid::new_v4(), None, Some(json!({"sub": "ada"})), tx);
        assert_eq!(handle.claims().unwrap()["sub"], "ada");
        assert!(handle.emit("a", Value::Null));

        drop(rx);
        assert!(!handle.is_connected());
        assert!(!handle.emit("a", Value::Null));
    }
}

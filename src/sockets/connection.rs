//! Websocket endpoint and per-connection lifecycle.
//!
//! # Data Flow
//! ```text
//! GET <sockets.path> (upgrade)
//!     → optional JWT auth (?token= or first `authenticate` event)
//!     → Socket built, every plugin attached in registration order
//!     → handle registered in SocketServer
//!     → read loop: Envelope → listeners
//!     → `disconnect` listeners, handle removed
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query};
use axum::http::Extensions;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::context::AppContext;
use crate::sockets::plugin::SocketPlugin;
use crate::sockets::socket::{Envelope, Outbound, Socket, SocketHandle};

/// Reserved event, dispatched only by the server when a connection ends.
pub const DISCONNECT: &str = "disconnect";

/// Everything a connection needs, shared by all connections.
pub(crate) struct SocketRuntime {
    pub app: AppContext,
    pub plugins: Vec<SocketPlugin>,
}

/// Router serving the websocket endpoint at `path`.
pub(crate) fn socket_router(runtime: Arc<SocketRuntime>, path: &str) -> Router {
    Router::new().route(
        path,
        get(
            move |ws: WebSocketUpgrade, Query(query): Query<HashMap<String, String>>, extensions: Extensions| {
                let runtime = runtime.clone();
                async move { upgrade(runtime, ws, query, extensions) }
            },
        ),
    )
}

fn upgrade(
    runtime: Arc<SocketRuntime>,
    ws: WebSocketUpgrade,
    mut query: HashMap<String, String>,
    extensions: Extensions,
) -> Response {
    let remote_addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let token = query.remove("token");

    ws.on_upgrade(move |socket| serve(runtime, socket, remote_addr, token))
}

async fn serve(
    runtime: Arc<SocketRuntime>,
    ws: WebSocket,
    remote_addr: Option<SocketAddr>,
    query_token: Option<String>,
) {
    let id = Uuid::new_v4();
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Text(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
        let _ = sink.close().await;
    });

    let remote = remote_addr.map(|addr| addr.to_string()).unwrap_or_else(|| "-".to_string());
    tracing::info!(socket_id = %id, remote = %remote, "socket [{}] connected: {}", id, remote);

    let config = &runtime.app.settings().sockets;
    let claims = if config.auth {
        let timeout = Duration::from_millis(config.auth_timeout_ms);
        match authenticate(&runtime.app, &mut stream, query_token, timeout).await {
            Ok(claims) => Some(claims),
            Err(reason) => {
                tracing::warn!(socket_id = %id, reason = %reason, "Socket authentication failed");
                let rejected = SocketHandle::new(id, remote_addr, None, tx);
                rejected.emit("unauthorized", json!({ "message": reason }));
                rejected.disconnect();
                drop(rejected);
                let _ = writer.await;
                return;
            }
        }
    } else {
        None
    };

    let authenticated = claims.is_some();
    let handle = SocketHandle::new(id, remote_addr, claims, tx);
    if authenticated {
        handle.emit("authenticated", json!({}));
    }

    let mut socket = Socket::new(handle.clone(), runtime.app.clone());
    for plugin in &runtime.plugins {
        plugin.attach(&mut socket);
    }

    let io = runtime.app.io().clone();
    io.register(handle.clone());

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(text.as_str()) {
                Ok(envelope) if envelope.event == DISCONNECT => {
                    tracing::debug!(socket_id = %id, "Ignoring client-sent disconnect event");
                }
                Ok(envelope) => {
                    socket.dispatch(&envelope.event, envelope.data).await;
                }
                Err(e) => {
                    tracing::debug!(socket_id = %id, error = %e, "Ignoring malformed socket frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(socket_id = %id, error = %e, "Socket read error");
                break;
            }
        }
    }

    socket.dispatch(DISCONNECT, Value::Null).await;
    io.remove(id);
    handle.disconnect();
    drop(socket);
    drop(handle);
    let _ = writer.await;

    tracing::info!(socket_id = %id, "socket [{}] disconnected", id);
}

async fn authenticate(
    app: &AppContext,
    stream: &mut SplitStream<WebSocket>,
    query_token: Option<String>,
    timeout: Duration,
) -> Result<Value, String> {
    let verifier = app
        .verifier()
        .ok_or_else(|| "authentication is not configured".to_string())?;

    let token = match query_token {
        Some(token) => token,
        None => read_auth_event(stream, timeout).await?,
    };

    verifier.verify(&token).map_err(|e| e.to_string())
}

async fn read_auth_event(
    stream: &mut SplitStream<WebSocket>,
    timeout: Duration,
) -> Result<String, String> {
    let first_text = async {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
        None
    };

    let text = match tokio::time::timeout(timeout, first_text).await {
        Err(_) => return Err("authentication timed out".to_string()),
        Ok(None) => return Err("connection closed before authentication".to_string()),
        Ok(Some(text)) => text,
    };

    let envelope: Envelope = serde_json::from_str(text.as_str())
        .map_err(|_| "malformed authenticate event".to_string())?;
    if envelope.event != "authenticate" {
        return Err("expected authenticate event".to_string());
    }

    envelope
        .data
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "missing token".to_string())
}

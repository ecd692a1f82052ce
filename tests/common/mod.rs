//! Shared fixture application for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use mentat::config::loader::load_settings;
use mentat::config::{AppLayout, Environment, Settings};
use mentat::{respond, ActionError, AppContext, Controller, Handler, Mentat, MentatBuilder, RequestContext, Shutdown};

pub const SECRET: &str = "fixture-secret";

pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/server")
}

pub fn fixture_settings() -> Settings {
    load_settings(&AppLayout::new(fixture_root())).unwrap()
}

/// Builder for the fixture application with every handler registered.
pub fn fixture_app() -> MentatBuilder {
    bare_app().socket_plugin("echo", |socket| {
        socket.on("echo", |handle, data| async move {
            handle.emit("echo", data);
        });
    })
}

/// The fixture application without any socket plugin.
pub fn bare_app() -> MentatBuilder {
    Mentat::builder()
        .root(fixture_root())
        .environment(Environment::Test)
        .handler(basic_http())
        .handler(controllers())
        .controller(echo_controller())
}

fn basic_http() -> Handler {
    Handler::new("BasicHTTP")
        .function("test200", |_request| async { StatusCode::OK })
        .function("defaultResponderError", |_request| async {
            respond(Err(ActionError::new("Something went wrong")))
        })
        .function("defaultResponderNotFound", |_request| async { respond(Ok(None)) })
        .function("secret", |request: RequestContext| async move {
            respond(Ok(request.claims.clone()))
        })
        .function("item", |request: RequestContext| async move {
            let id = request.param("id").unwrap_or_default().to_string();
            respond(Ok(Some(json!({ "id": id }))))
        })
        .function("echo", |request: RequestContext| async move {
            respond(Ok(request.payload.clone()))
        })
}

fn controllers() -> Handler {
    Handler::new("Controllers").function("simpleResponse", |request: RequestContext| async move {
        let options = request.payload.clone().unwrap_or(Value::Null);
        respond(request.app().call("Echo", "echo", options).await)
    })
}

fn echo_controller() -> Controller {
    Controller::new("Echo").action("echo", |_app, options: Value| async move {
        if options.is_null() {
            return Err(ActionError::new("Nothing to echo"));
        }
        Ok(Some(json!({ "echo": options })))
    })
}

/// A running fixture server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: AppContext,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Load `builder` and serve it on an ephemeral port.
pub async fn spawn(builder: MentatBuilder) -> TestServer {
    let mentat = builder.load().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = mentat.context().clone();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = mentat.run(listener, rx).await;
    });

    TestServer { addr, app, shutdown }
}

pub fn token(secret: &str, exp_offset: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    encode(
        &Header::default(),
        &json!({ "sub": "ada", "exp": now + exp_offset }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Mount one axum route per declared path, one method filter per method
//! - Mount the websocket endpoint
//! - Wire up middleware (request id, tracing, timeout, access log)
//! - Dispatch: auth → extract → validate → handler function
//! - Serve on a listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::error::BootstrapError;
use crate::http::request::{ExtractError, RequestContext};
use crate::http::response;
use crate::observability::metrics;
use crate::registry::handler::HandlerFn;
use crate::registry::{Handler, Registry};
use crate::routing::{RouteEntry, RouteTable};
use crate::sockets::connection::{socket_router, SocketRuntime};
use crate::sockets::SocketPlugin;

/// A mounted route: its resolved entry plus the function serving it.
struct Endpoint {
    entry: RouteEntry,
    function: HandlerFn,
    app: AppContext,
    body_limit: usize,
}

impl Endpoint {
    async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let response = self.handle(request).await;
        metrics::record_request(
            self.entry.method.as_str(),
            &self.entry.path,
            response.status().as_u16(),
            start,
        );
        response
    }

    async fn handle(&self, request: Request<Body>) -> Response {
        let claims = if self.entry.auth {
            let Some(verifier) = self.app.verifier() else {
                return response::error(StatusCode::INTERNAL_SERVER_ERROR, "Authentication is not configured");
            };
            match verifier.verify_headers(request.headers()) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    tracing::debug!(path = %self.entry.path, error = %e, "Authentication rejected");
                    return response::unauthorized(e.to_string());
                }
            }
        } else {
            None
        };

        let mut ctx = match RequestContext::from_request(request, self.app.clone(), self.body_limit).await {
            Ok(ctx) => ctx,
            Err(ExtractError::BodyTooLarge) => {
                return response::error(StatusCode::PAYLOAD_TOO_LARGE, ExtractError::BodyTooLarge.message());
            }
            Err(e) => return response::bad_request(e.message()),
        };
        ctx.claims = claims;

        if let Some(rules) = &self.entry.validate {
            if let Err(failure) = rules.check(&ctx.params, &ctx.query, ctx.payload.as_ref()) {
                tracing::debug!(path = %self.entry.path, reason = %failure, "Validation rejected");
                return response::validation_failed(&failure);
            }
        }

        (self.function)(ctx).await
    }
}

/// HTTP server for the bootstrapped application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the router for a resolved route table.
    pub(crate) fn new(
        table: &RouteTable,
        handlers: &Registry<Handler>,
        app: &AppContext,
        plugins: Vec<SocketPlugin>,
    ) -> Result<Self, BootstrapError> {
        let settings = app.settings();
        let mut router = Router::new();

        for (path, entries) in table.by_path() {
            let mut method_router = MethodRouter::new();
            for entry in entries {
                let function = handlers
                    .get(&entry.handler)
                    .and_then(|handler| handler.get_function(&entry.function))
                    .ok_or_else(|| BootstrapError::UnknownFunction {
                        method: entry.method.to_string(),
                        path: entry.path.clone(),
                        handler: entry.handler.clone(),
                        function: entry.function.clone(),
                    })?;
                let filter = MethodFilter::try_from(entry.method.clone()).map_err(|_| {
                    BootstrapError::InvalidRoute {
                        method: entry.method.to_string(),
                        path: entry.path.clone(),
                        reason: "unsupported method".to_string(),
                    }
                })?;

                let endpoint = Arc::new(Endpoint {
                    entry: entry.clone(),
                    function,
                    app: app.clone(),
                    body_limit: settings.server.body_limit_bytes,
                });
                method_router = method_router.on(filter, move |request: Request| {
                    let endpoint = endpoint.clone();
                    async move { endpoint.dispatch(request).await }
                });
            }
            router = router.route(path, method_router);
        }

        if settings.sockets.enabled {
            if table.entries().iter().any(|entry| entry.path == settings.sockets.path) {
                return Err(BootstrapError::InvalidRoute {
                    method: "GET".to_string(),
                    path: settings.sockets.path.clone(),
                    reason: "conflicts with the socket endpoint".to_string(),
                });
            }
            let runtime = Arc::new(SocketRuntime {
                app: app.clone(),
                plugins,
            });
            router = router.merge(socket_router(runtime, &settings.sockets.path));
            tracing::info!(path = %settings.sockets.path, "Socket endpoint mounted");
        }

        let mut router = router.fallback(|| async { response::not_found() });
        if app.environment().is_development() {
            router = router.layer(middleware::from_fn(access_log));
        }

        Ok(Self {
            router: Self::with_layers(router, Duration::from_secs(settings.server.request_timeout_secs)),
        })
    }

    #[allow(deprecated)]
    fn with_layers(router: Router, timeout: Duration) -> Router {
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(timeout)),
        )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on the given listener until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Server listening: http://{}", addr);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Development access log: `[remote] METHOD path - status`.
async fn access_log(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    tracing::info!("[{}] {} {} - {}", remote, method, path, response.status().as_u16());
    response
}

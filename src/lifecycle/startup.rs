//! Startup orchestration.
//!
//! # Responsibilities
//! - Collect explicit registrations (handlers, controllers, models, ...)
//! - Run the loading sequence in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, except missing optional files
//! - Loaders run sequentially on one thread, before any traffic
//! - Listeners start last (traffic only when ready)

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::loader::{load_database, load_routes, load_settings, load_validators};
use crate::config::validation::validate_settings;
use crate::config::{AppLayout, ConfigError, DatabaseConfig, Environment, Settings};
use crate::context::AppContext;
use crate::error::{ActionError, BootstrapError, MentatError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::mail::{create_transport, Transporter};
use crate::observability::metrics;
use crate::registry::discovery::{module_name, scan_dir};
use crate::registry::model::ModelFactory;
use crate::registry::{Controller, Handler, MethodRegistry, Model, ModelRegistry, Named, Registry, ServerMethod};
use crate::routing::RouteTable;
use crate::sockets::{Socket, SocketPlugin};

/// Collects registrations before the loading sequence runs.
pub struct MentatBuilder {
    layout: AppLayout,
    environment: Option<Environment>,
    settings: Option<Settings>,
    handlers: Vec<Handler>,
    controllers: Vec<Controller>,
    models: Vec<ModelFactory>,
    methods: Vec<ServerMethod>,
    plugins: Vec<SocketPlugin>,
    transporter: Option<Arc<dyn Transporter>>,
}

impl MentatBuilder {
    fn new() -> Self {
        Self {
            layout: AppLayout::default(),
            environment: None,
            settings: None,
            handlers: Vec::new(),
            controllers: Vec::new(),
            models: Vec::new(),
            methods: Vec::new(),
            plugins: Vec::new(),
            transporter: None,
        }
    }

    /// Application root holding `config/` and `handlers/` (default `./server`).
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.layout = AppLayout::new(root);
        self
    }

    /// Override the runtime mode instead of reading `APP_ENV`.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Use these settings instead of `config/settings.toml`.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Register a handler; route files in `handlers/` attach to it by name.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Register a controller callable through `AppContext::call`.
    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Register a model built from the environment's database options.
    pub fn model<F, M>(mut self, factory: F) -> Self
    where
        F: FnOnce(&DatabaseConfig) -> M + Send + 'static,
        M: Model,
    {
        self.models
            .push(Box::new(move |database: &DatabaseConfig| Arc::new(factory(database)) as Arc<dyn Model>));
        self
    }

    /// Register a server method callable through `AppContext::method`.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(AppContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
    {
        self.methods.push(ServerMethod::new(name, f));
        self
    }

    /// Register a function run for every new socket connection.
    pub fn socket_plugin<F>(mut self, name: impl Into<String>, attach: F) -> Self
    where
        F: Fn(&mut Socket) + Send + Sync + 'static,
    {
        self.plugins.push(SocketPlugin::new(name, attach));
        self
    }

    /// Use a custom mail transporter instead of `mail.transport`.
    pub fn transporter(mut self, transporter: Arc<dyn Transporter>) -> Self {
        self.transporter = Some(transporter);
        self
    }

    /// Run the loading sequence:
    /// settings → models → transporter → methods → controllers → handlers
    /// → routes → server and sockets.
    pub fn load(self) -> Result<Mentat, BootstrapError> {
        let environment = self.environment.unwrap_or_else(Environment::from_env);
        tracing::info!(
            environment = %environment,
            root = %self.layout.root().display(),
            "Loading application"
        );

        let settings = match self.settings {
            Some(settings) => {
                validate_settings(&settings).map_err(ConfigError::Validation)?;
                settings
            }
            None => load_settings(&self.layout)?,
        };
        let settings = Arc::new(settings);

        let database = load_database(&self.layout, &environment)?;
        let models = ModelRegistry::load(database, self.models)?;

        let transporter = self
            .transporter
            .unwrap_or_else(|| create_transport(&settings.mail));

        let mut methods = MethodRegistry::default();
        for method in self.methods {
            methods.register(method)?;
        }

        let mut controllers = Registry::new("controller");
        for controller in self.controllers {
            controllers.insert(controller)?;
        }

        let handlers = load_handlers(&self.layout, self.handlers)?;

        let validators = load_validators(&self.layout)?;
        let extra_routes = load_routes(&self.layout)?;
        let routes = RouteTable::resolve(&handlers, extra_routes, &validators, &settings)?;
        tracing::info!(routes = routes.len(), "Routes registered");

        let app = AppContext::new(environment, settings, models, controllers, methods, transporter);

        for plugin in &self.plugins {
            tracing::info!(name = %plugin.name(), "Socket plugin registered");
        }
        let server = HttpServer::new(&routes, &handlers, &app, self.plugins)?;

        Ok(Mentat { app, routes, server })
    }
}

/// Register code-declared handlers, merging route files from `handlers/`.
fn load_handlers(layout: &AppLayout, declared: Vec<Handler>) -> Result<Registry<Handler>, BootstrapError> {
    let mut pending: BTreeMap<String, Handler> = BTreeMap::new();
    for handler in declared {
        let name = handler.name().to_string();
        if pending.contains_key(&name) {
            return Err(BootstrapError::DuplicateName { kind: "handler", name });
        }
        pending.insert(name, handler);
    }

    for path in scan_dir(&layout.handlers_dir(), Some(".toml"))? {
        let Some(name) = module_name(&path) else {
            continue;
        };
        let handler = match pending.get_mut(name) {
            Some(handler) => handler,
            None => {
                return Err(BootstrapError::UnknownHandlerFile {
                    handler: name.to_string(),
                    path,
                })
            }
        };
        handler.load_route_file(&path)?;
    }

    let mut registry = Registry::new("handler");
    for handler in pending.into_values() {
        registry.insert(handler)?;
    }
    Ok(registry)
}

/// A loaded application, ready to serve.
pub struct Mentat {
    app: AppContext,
    routes: RouteTable,
    server: HttpServer,
}

impl Mentat {
    /// Start collecting registrations.
    pub fn builder() -> MentatBuilder {
        MentatBuilder::new()
    }

    /// Application context shared with handlers and sockets.
    pub fn context(&self) -> &AppContext {
        &self.app
    }

    /// Resolved route table.
    pub fn route_table(&self) -> &RouteTable {
        &self.routes
    }

    /// The router, for serving without binding a listener.
    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        self.server.run(listener, shutdown).await
    }

    /// Bind `server.host:server.port` and serve until SIGINT/SIGTERM.
    pub async fn start(self) -> Result<(), MentatError> {
        let settings = self.app.settings();

        if settings.observability.metrics_enabled {
            match settings.observability.metrics_address.parse() {
                Ok(addr) => metrics::init_metrics(addr),
                Err(_) => tracing::error!(
                    metrics_address = %settings.observability.metrics_address,
                    "Failed to parse metrics address"
                ),
            }
        }

        let address = settings.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| MentatError::Bind { address, source })?;

        let shutdown = Shutdown::new();
        signals::spawn_signal_handler(&shutdown);

        self.run(listener, shutdown.subscribe()).await?;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crate::routing::RouteSpec;

    fn missing_root() -> PathBuf {
        std::env::temp_dir().join(format!("mentat-empty-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_load_without_any_files() {
        let mentat = Mentat::builder()
            .root(missing_root())
            .environment(Environment::Test)
            .handler(
                Handler::new("Ping")
                    .route(RouteSpec::get("/ping", "ping"))
                    .function("ping", |_| async { StatusCode::NO_CONTENT }),
            )
            .load()
            .unwrap();

        assert_eq!(mentat.route_table().len(), 1);
        assert!(mentat.context().controllers().is_empty());
        assert_eq!(mentat.context().environment(), &Environment::Test);
    }

    #[test]
    fn test_duplicate_handler_is_fatal() {
        let err = Mentat::builder()
            .root(missing_root())
            .handler(Handler::new("Ping"))
            .handler(Handler::new("Ping"))
            .load()
            .err()
            .unwrap();

        assert!(matches!(err, BootstrapError::DuplicateName { kind: "handler", .. }));
    }

    #[test]
    fn test_route_file_for_unknown_handler_is_fatal() {
        let root = missing_root();
        std::fs::create_dir_all(root.join("handlers")).unwrap();
        std::fs::write(root.join("handlers/Ghost.handler.toml"), "").unwrap();

        let err = Mentat::builder().root(&root).load().err().unwrap();
        assert!(matches!(err, BootstrapError::UnknownHandlerFile { ref handler, .. } if handler == "Ghost"));

        std::fs::remove_dir_all(root).unwrap_or_default();
    }

    #[test]
    fn test_socket_path_conflict_is_fatal() {
        let err = Mentat::builder()
            .root(missing_root())
            .handler(
                Handler::new("Clash")
                    .route(RouteSpec::get("/socket", "get"))
                    .function("get", |_| async { StatusCode::OK }),
            )
            .load()
            .err()
            .unwrap();

        assert!(matches!(err, BootstrapError::InvalidRoute { .. }));
    }

    #[test]
    fn test_invalid_settings_override_rejected() {
        let mut settings = Settings::default();
        settings.server.request_timeout_secs = 0;

        let err = Mentat::builder()
            .root(missing_root())
            .settings(settings)
            .load()
            .err()
            .unwrap();

        assert!(matches!(err, BootstrapError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unmountable_paths_are_errors() {
        let users = |first: &str, second: &str| {
            Handler::new("Users")
                .route(RouteSpec::get(first, "show"))
                .route(RouteSpec::post(second, "create"))
                .function("show", |_| async { StatusCode::OK })
                .function("create", |_| async { StatusCode::CREATED })
        };

        let err = Mentat::builder()
            .root(missing_root())
            .handler(users("/users/{id}", "/users/{name}"))
            .load()
            .err()
            .unwrap();
        assert!(matches!(err, BootstrapError::InvalidRoute { ref path, .. } if path == "/users/{name}"));

        let err = Mentat::builder()
            .root(missing_root())
            .handler(users("/users/:id", "/users"))
            .load()
            .err()
            .unwrap();
        assert!(matches!(err, BootstrapError::InvalidRoute { ref path, .. } if path == "/users/:id"));
    }
}

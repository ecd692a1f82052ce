//! Application context shared by handlers, controllers, methods and sockets.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{Environment, Settings};
use crate::error::ActionError;
use crate::http::auth::TokenVerifier;
use crate::mail::Transporter;
use crate::registry::{Controller, ControllerResult, MethodRegistry, ModelRegistry, Registry};
use crate::sockets::SocketServer;

struct AppInner {
    environment: Environment,
    settings: Arc<Settings>,
    models: ModelRegistry,
    controllers: Registry<Controller>,
    methods: MethodRegistry,
    transporter: Arc<dyn Transporter>,
    verifier: Option<TokenVerifier>,
    io: SocketServer,
}

/// Everything loaded at startup. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppInner>,
}

impl AppContext {
    pub(crate) fn new(
        environment: Environment,
        settings: Arc<Settings>,
        models: ModelRegistry,
        controllers: Registry<Controller>,
        methods: MethodRegistry,
        transporter: Arc<dyn Transporter>,
    ) -> Self {
        let verifier = TokenVerifier::from_config(&settings.auth);
        Self {
            inner: Arc::new(AppInner {
                environment,
                settings,
                models,
                controllers,
                methods,
                transporter,
                verifier,
                io: SocketServer::new(),
            }),
        }
    }

    /// Runtime mode the application was loaded in.
    pub fn environment(&self) -> &Environment {
        &self.inner.environment
    }

    /// Validated application settings.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Loaded models and their database options.
    pub fn models(&self) -> &ModelRegistry {
        &self.inner.models
    }

    /// Registered controllers.
    pub fn controllers(&self) -> &Registry<Controller> {
        &self.inner.controllers
    }

    /// The controller registered as `name`.
    pub fn controller(&self, name: &str) -> Option<Arc<Controller>> {
        self.inner.controllers.get(name)
    }

    /// Registered server methods.
    pub fn methods(&self) -> &MethodRegistry {
        &self.inner.methods
    }

    /// Transport used for outgoing mail.
    pub fn transporter(&self) -> &Arc<dyn Transporter> {
        &self.inner.transporter
    }

    pub(crate) fn verifier(&self) -> Option<&TokenVerifier> {
        self.inner.verifier.as_ref()
    }

    /// Connected sockets.
    pub fn io(&self) -> &SocketServer {
        &self.inner.io
    }

    /// Invoke `controller.action(options)`.
    pub async fn call(&self, controller: &str, action: &str, options: Value) -> ControllerResult {
        match self.controller(controller) {
            Some(controller) => controller.call(self, action, options).await,
            None => Err(ActionError::new(format!("unknown controller {}", controller))),
        }
    }

    /// Invoke a server method.
    pub async fn method(&self, name: &str, args: Value) -> Result<Value, ActionError> {
        self.inner.methods.call(self, name, args).await
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(
            Environment::Test,
            Arc::new(Settings::default()),
            ModelRegistry::default(),
            Registry::new("controller"),
            MethodRegistry::default(),
            Arc::new(crate::mail::JsonTransport::new("test@localhost")),
        )
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("environment", &self.inner.environment)
            .field("controllers", &self.inner.controllers.names().collect::<Vec<_>>())
            .field("models", &self.inner.models.names().collect::<Vec<_>>())
            .field("sockets", &self.inner.io.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_unknown_controller() {
        let app = AppContext::for_tests();
        let err = app.call("Users", "find", json!({})).await.unwrap_err();
        assert_eq!(err.message, "unknown controller Users");
        assert!(app.method("missing", Value::Null).await.is_err());
        assert!(app.verifier().is_none());
    }
}

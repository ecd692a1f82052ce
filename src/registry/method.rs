//! Server methods: named async functions shared by handlers and controllers.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::{ActionError, BootstrapError};

type MethodFn = Arc<dyn Fn(AppContext, Value) -> BoxFuture<'static, Result<Value, ActionError>> + Send + Sync>;

/// A single named server method.
#[derive(Clone)]
pub struct ServerMethod {
    name: String,
    f: MethodFn,
}

impl ServerMethod {
    /// Wrap an async function as a named server method.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(AppContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |app, args| Box::pin(f(app, args))),
        }
    }

    /// Name used to call the method.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ServerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerMethod").field("name", &self.name).finish()
    }
}

/// All registered server methods.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, ServerMethod>,
}

impl MethodRegistry {
    pub(crate) fn register(&mut self, method: ServerMethod) -> Result<(), BootstrapError> {
        if self.methods.contains_key(method.name()) {
            return Err(BootstrapError::DuplicateName {
                kind: "method",
                name: method.name().to_string(),
            });
        }
        tracing::info!(name = %method.name(), "method registered: {}", method.name());
        self.methods.insert(method.name().to_string(), method);
        Ok(())
    }

    /// Whether a method named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Invoke a method by name.
    pub async fn call(&self, app: &AppContext, name: &str, args: Value) -> Result<Value, ActionError> {
        match self.methods.get(name) {
            Some(method) => (method.f)(app.clone(), args).await,
            None => Err(ActionError::new(format!("unknown server method {}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_call() {
        let app = AppContext::for_tests();
        let mut methods = MethodRegistry::default();
        methods
            .register(ServerMethod::new("double", |_, args| async move {
                let n = args.as_i64().ok_or_else(|| ActionError::from("expected a number"))?;
                Ok(json!(n * 2))
            }))
            .unwrap();

        assert!(methods.register(ServerMethod::new("double", |_, a| async move { Ok(a) })).is_err());
        assert_eq!(methods.call(&app, "double", json!(21)).await, Ok(json!(42)));
        assert!(methods.call(&app, "double", json!("x")).await.is_err());
        assert!(methods.call(&app, "triple", json!(1)).await.is_err());
    }
}

//! Controller records: named groups of business-logic actions.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::ActionError;
use crate::registry::Named;

/// Outcome of a controller action. `Ok(None)` means "nothing found".
pub type ControllerResult = Result<Option<Value>, ActionError>;

type Action = Arc<dyn Fn(AppContext, Value) -> BoxFuture<'static, ControllerResult> + Send + Sync>;

/// A named group of business-logic actions, decoupled from HTTP routing.
///
/// ```ignore
/// let users = Controller::new("Users")
///     .action("find", |app, options| async move { Ok(Some(options)) });
/// ```
pub struct Controller {
    name: String,
    actions: BTreeMap<String, Action>,
}

impl Controller {
    /// An empty controller named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: BTreeMap::new(),
        }
    }

    /// Add a named action.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(AppContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControllerResult> + Send + 'static,
    {
        let action: Action = Arc::new(move |app, options| Box::pin(f(app, options)));
        self.actions.insert(name.into(), action);
        self
    }

    /// Whether `name` is a registered action.
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Action names, in no particular order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Invoke an action by name.
    pub async fn call(&self, app: &AppContext, action: &str, options: Value) -> ControllerResult {
        match self.actions.get(action) {
            Some(f) => f(app.clone(), options).await,
            None => Err(ActionError::new(format!(
                "controller {} has no action {}",
                self.name, action
            ))),
        }
    }
}

impl Named for Controller {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_action() {
        let app = AppContext::for_tests();
        let controller = Controller::new("Echo")
            .action("echo", |_, options| async move { Ok(Some(options)) })
            .action("fail", |_, _| async { Err(ActionError::from("boom")) });

        assert!(controller.has_action("echo"));
        assert_eq!(
            controller.call(&app, "echo", json!({"a": 1})).await,
            Ok(Some(json!({"a": 1})))
        );
        assert_eq!(controller.call(&app, "fail", Value::Null).await, Err(ActionError::from("boom")));

        let err = controller.call(&app, "missing", Value::Null).await.unwrap_err();
        assert!(err.message.contains("no action missing"));
    }
}

//! Handler records: named groups of request functions plus route declarations.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::config::loader::parse_optional;
use crate::error::BootstrapError;
use crate::http::request::RequestContext;
use crate::registry::Named;
use crate::routing::RouteSpec;

/// A request-handling function stored in a handler.
pub type HandlerFn = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Response> + Send + Sync>;

/// A named group of HTTP request functions with their route declarations.
pub struct Handler {
    name: String,
    functions: BTreeMap<String, HandlerFn>,
    routes: Vec<RouteSpec>,
}

impl Handler {
    /// A handler with no routes or functions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: BTreeMap::new(),
            routes: Vec::new(),
        }
    }

    /// Declare a route served by one of this handler's functions.
    pub fn route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }

    /// Add a named request function.
    pub fn function<F, Fut, R>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let function: HandlerFn = Arc::new(move |request| {
            let fut = f(request);
            Box::pin(async move { fut.await.into_response() })
        });
        self.functions.insert(name.into(), function);
        self
    }

    /// The function registered as `name`, if any.
    pub fn get_function(&self, name: &str) -> Option<HandlerFn> {
        self.functions.get(name).cloned()
    }

    /// Routes declared in code and loaded from route files.
    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    /// Append routes read from this handler's route file.
    pub(crate) fn load_route_file(&mut self, path: &Path) -> Result<usize, BootstrapError> {
        let file: HandlerFile = parse_optional(path)?.unwrap_or_default();
        let count = file.routes.len();
        self.routes.extend(file.routes);
        tracing::debug!(handler = %self.name, path = %path.display(), routes = count, "Route file merged");
        Ok(count)
    }
}

#[derive(Debug, Default, Deserialize)]
struct HandlerFile {
    #[serde(default)]
    routes: Vec<RouteSpec>,
}

impl Named for Handler {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("routes", &self.routes)
            .finish()
    }
}

//! Route table built at startup.
//!
//! # Responsibilities
//! - Resolve declarations against the handler registry and validator rules
//! - Reject duplicate `(method, path)` pairs and malformed routes
//! - Expose the final table for the HTTP server and for inspection
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Entries keep registration order: handler routes, then extra routes
//! - Explicit errors rather than silently skipping a bad declaration

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::http::Method;

use crate::config::Settings;
use crate::error::BootstrapError;
use crate::http::validation::ValidationRules;
use crate::registry::{Handler, Named, Registry};
use crate::routing::route::{check_path, parse_method, path_shape, ConfiguredRoute, RouteSpec, ValidateSpec};

/// A resolved route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    pub handler: String,
    pub function: String,
    pub auth: bool,
    pub validate: Option<Arc<ValidationRules>>,
}

/// All routes served by the application.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashSet<(Method, String)>,
    /// First path registered for each shape.
    shapes: HashMap<String, String>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve handler routes followed by extra configured routes.
    pub fn resolve(
        handlers: &Registry<Handler>,
        extra: Vec<ConfiguredRoute>,
        validators: &HashMap<String, ValidationRules>,
        settings: &Settings,
    ) -> Result<Self, BootstrapError> {
        let mut table = Self::new();
        let validators: HashMap<&str, Arc<ValidationRules>> = validators
            .iter()
            .map(|(name, rules)| (name.as_str(), Arc::new(rules.clone())))
            .collect();

        for handler in handlers.iter() {
            for spec in handler.routes() {
                let entry = resolve_spec(handlers, handler.name(), spec.clone(), &validators, settings)?;
                table.insert(entry)?;
            }
        }

        for route in extra {
            let (handler, spec) = route.into_spec();
            let entry = resolve_spec(handlers, &handler, spec, &validators, settings)?;
            table.insert(entry)?;
        }

        Ok(table)
    }

    /// Add a resolved route, rejecting a duplicate `(method, path)`, a path
    /// the router cannot mount, or captures named differently from an
    /// earlier path of the same shape (`/users/{id}` vs `/users/{name}`).
    pub fn insert(&mut self, entry: RouteEntry) -> Result<(), BootstrapError> {
        let invalid = |reason: String| BootstrapError::InvalidRoute {
            method: entry.method.to_string(),
            path: entry.path.clone(),
            reason,
        };
        check_path(&entry.path).map_err(invalid)?;
        let shape = path_shape(&entry.path);
        if let Some(existing) = self.shapes.get(&shape) {
            if *existing != entry.path {
                return Err(invalid(format!("captures conflict with {}", existing)));
            }
        }

        let key = (entry.method.clone(), entry.path.clone());
        if !self.index.insert(key) {
            return Err(BootstrapError::DuplicateRoute {
                method: entry.method.to_string(),
                path: entry.path,
            });
        }

        tracing::debug!(
            method = %entry.method,
            path = %entry.path,
            handler = %entry.handler,
            function = %entry.function,
            auth = entry.auth,
            "Route registered"
        );
        self.shapes.entry(shape).or_insert_with(|| entry.path.clone());
        self.entries.push(entry);
        Ok(())
    }

    /// The entry for an exact method and path.
    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|entry| entry.method == *method && entry.path == path)
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Entries grouped by path, for mounting one router per path.
    pub fn by_path(&self) -> BTreeMap<&str, Vec<&RouteEntry>> {
        let mut grouped: BTreeMap<&str, Vec<&RouteEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.path.as_str()).or_default().push(entry);
        }
        grouped
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_spec(
    handlers: &Registry<Handler>,
    handler_name: &str,
    spec: RouteSpec,
    validators: &HashMap<&str, Arc<ValidationRules>>,
    settings: &Settings,
) -> Result<RouteEntry, BootstrapError> {
    let invalid = |reason: &str| BootstrapError::InvalidRoute {
        method: spec.method.clone(),
        path: spec.path.clone(),
        reason: reason.to_string(),
    };

    let method = parse_method(&spec.method).ok_or_else(|| invalid("unsupported method"))?;
    check_path(&spec.path).map_err(|reason| invalid(&reason))?;

    let handler = handlers
        .get(handler_name)
        .ok_or_else(|| BootstrapError::UnknownHandler {
            method: spec.method.clone(),
            path: spec.path.clone(),
            handler: handler_name.to_string(),
        })?;
    if handler.get_function(&spec.handler).is_none() {
        return Err(BootstrapError::UnknownFunction {
            method: spec.method.clone(),
            path: spec.path.clone(),
            handler: handler_name.to_string(),
            function: spec.handler.clone(),
        });
    }

    let validate = match &spec.validate {
        None => None,
        Some(ValidateSpec::Inline(rules)) => Some(Arc::new(rules.clone())),
        Some(ValidateSpec::Named(name)) => Some(
            validators
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| BootstrapError::UnknownValidator {
                    method: spec.method.clone(),
                    path: spec.path.clone(),
                    validator: name.clone(),
                })?,
        ),
    };

    let auth = spec.auth.unwrap_or(settings.auth.default_required);
    if auth && settings.auth.key.is_none() {
        return Err(BootstrapError::MissingAuthKey {
            method: spec.method,
            path: spec.path,
        });
    }

    Ok(RouteEntry {
        method,
        path: spec.path,
        handler: handler_name.to_string(),
        function: spec.handler,
        auth,
        validate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn handlers() -> Registry<Handler> {
        let mut registry = Registry::new("handler");
        registry
            .insert(
                Handler::new("Users")
                    .route(RouteSpec::get("/users", "list"))
                    .route(RouteSpec::post("/users", "create").validate_with("createUser"))
                    .function("list", |_| async { StatusCode::OK })
                    .function("create", |_| async { StatusCode::CREATED }),
            )
            .unwrap();
        registry
    }

    fn validators() -> HashMap<String, ValidationRules> {
        HashMap::from([("createUser".to_string(), ValidationRules::default())])
    }

    fn extra(handler: &str, function: &str, path: &str) -> ConfiguredRoute {
        ConfiguredRoute {
            method: "GET".into(),
            path: path.into(),
            handler: handler.into(),
            function: function.into(),
            auth: None,
            validate: None,
        }
    }

    #[test]
    fn test_resolve_routes() {
        let table = RouteTable::resolve(
            &handlers(),
            vec![extra("Users", "list", "/people")],
            &validators(),
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.find(&Method::POST, "/users").unwrap().validate.is_some());
        assert_eq!(table.find(&Method::GET, "/people").unwrap().function, "list");
        assert_eq!(table.by_path()["/users"].len(), 2);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let err = RouteTable::resolve(
            &handlers(),
            vec![extra("Users", "list", "/users")],
            &validators(),
            &Settings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_unknown_references_rejected() {
        let settings = Settings::default();

        let err = RouteTable::resolve(&handlers(), vec![extra("Posts", "list", "/posts")], &validators(), &settings)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownHandler { .. }));

        let err = RouteTable::resolve(&handlers(), vec![extra("Users", "show", "/u")], &validators(), &settings)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownFunction { .. }));

        let err = RouteTable::resolve(&handlers(), vec![], &HashMap::new(), &settings).unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownValidator { .. }));
    }

    #[test]
    fn test_auth_requires_key() {
        let mut settings = Settings::default();
        settings.auth.default_required = true;

        let err = RouteTable::resolve(&handlers(), vec![], &validators(), &settings).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingAuthKey { .. }));

        settings.auth.key = Some("secret".into());
        let table = RouteTable::resolve(&handlers(), vec![], &validators(), &settings).unwrap();
        assert!(table.entries().iter().all(|entry| entry.auth));
    }
    #[test]
    fn test_malformed_path_rejected() {
        let err = RouteTable::resolve(&handlers(), vec![extra("Users", "list", "/users/:id")], &validators(), &Settings::default())
            .unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidRoute { ref path, .. } if path == "/users/:id"));
    }

    #[test]
    fn test_conflicting_capture_names_rejected() {
        let extra_routes = vec![extra("Users", "list", "/users/{id}"), extra("Users", "list", "/users/{name}")];
        let err = RouteTable::resolve(&handlers(), extra_routes, &validators(), &Settings::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidRoute { ref path, .. } if path == "/users/{name}"));

        // Same path under another method shares the shape.
        let mut table = RouteTable::new();
        let entry = |method: Method| RouteEntry {
            method,
            path: "/users/{id}".into(),
            handler: "Users".into(),
            function: "list".into(),
            auth: false,
            validate: None,
        };
        table.insert(entry(Method::GET)).unwrap();
        table.insert(entry(Method::DELETE)).unwrap();
        assert_eq!(table.len(), 2);
    }
}

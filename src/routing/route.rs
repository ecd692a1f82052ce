//! Route declarations as written by handlers and route files.

use std::collections::HashSet;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::http::validation::ValidationRules;

/// Request validation attached to a route: inline rules or the name of a
/// rule set from `config/validator.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ValidateSpec {
    Named(String),
    Inline(ValidationRules),
}

/// A route declared by a handler. `handler` names one of the handler's
/// functions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    pub handler: String,

    /// `None` falls back to `auth.default_required`.
    #[serde(default)]
    pub auth: Option<bool>,

    #[serde(default)]
    pub validate: Option<ValidateSpec>,
}

impl RouteSpec {
    /// A route for an HTTP method given by name.
    pub fn new(method: impl Into<String>, path: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler: function.into(),
            auth: None,
            validate: None,
        }
    }

    /// A `GET` route.
    pub fn get(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new("GET", path, function)
    }

    /// A `POST` route.
    pub fn post(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new("POST", path, function)
    }

    /// A `PUT` route.
    pub fn put(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new("PUT", path, function)
    }

    /// A `DELETE` route.
    pub fn delete(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new("DELETE", path, function)
    }

    /// Require a valid bearer token.
    pub fn auth(mut self, required: bool) -> Self {
        self.auth = Some(required);
        self
    }

    /// Validate the request against inline rules.
    pub fn validate(mut self, rules: ValidationRules) -> Self {
        self.validate = Some(ValidateSpec::Inline(rules));
        self
    }

    /// Validate the request against a named rule set from `validator.toml`.
    pub fn validate_with(mut self, name: impl Into<String>) -> Self {
        self.validate = Some(ValidateSpec::Named(name.into()));
        self
    }
}

/// A route from `config/routes.toml`, naming both handler and function.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfiguredRoute {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub function: String,

    #[serde(default)]
    pub auth: Option<bool>,

    #[serde(default)]
    pub validate: Option<ValidateSpec>,
}

impl ConfiguredRoute {
    /// Split into the owning handler's name and a handler-level declaration.
    pub fn into_spec(self) -> (String, RouteSpec) {
        (
            self.handler,
            RouteSpec {
                method: self.method,
                path: self.path,
                handler: self.function,
                auth: self.auth,
                validate: self.validate,
            },
        )
    }
}

/// Parse a declared method name (case-insensitive).
pub fn parse_method(method: &str) -> Option<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        "HEAD" => Some(Method::HEAD),
        "OPTIONS" => Some(Method::OPTIONS),
        _ => None,
    }
}

/// Check a route path against the router's syntax: literal segments,
/// whole-segment `{name}` captures and a trailing `{*name}` wildcard.
pub fn check_path(path: &str) -> Result<(), String> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err("path must start with '/'".to_string());
    };

    let segments: Vec<&str> = rest.split('/').collect();
    let mut names = HashSet::new();
    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(format!("segment {:?} must use the {{name}} capture syntax", segment));
        }
        if !segment.contains(['{', '}']) {
            continue;
        }

        let capture = segment
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .ok_or_else(|| format!("segment {:?} must be a whole {{name}} capture", segment))?;
        let name = match capture.strip_prefix('*') {
            Some(name) if i + 1 == segments.len() => name,
            Some(_) => return Err("wildcard capture must be the last segment".to_string()),
            None => capture,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid capture name {:?}", name));
        }
        if !names.insert(name) {
            return Err(format!("capture {:?} appears twice", name));
        }
    }
    Ok(())
}

/// The path with capture names erased. Routes with the same shape must use
/// the same capture names.
pub(crate) fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get"), Some(Method::GET));
        assert_eq!(parse_method("Delete"), Some(Method::DELETE));
        assert_eq!(parse_method("*"), None);
        assert_eq!(parse_method("TRACE"), None);
    }

    #[test]
    fn test_validate_spec_forms() {
        let named: RouteSpec = toml::from_str(
            "method = \"POST\"\npath = \"/users\"\nhandler = \"create\"\nvalidate = \"createUser\"\n",
        )
        .unwrap();
        assert_eq!(named.validate, Some(ValidateSpec::Named("createUser".into())));

        let inline: RouteSpec = toml::from_str(
            "method = \"GET\"\npath = \"/users/{id}\"\nhandler = \"show\"\n[validate.params]\nid = { type = \"integer\", required = true }\n",
        )
        .unwrap();
        assert!(matches!(inline.validate, Some(ValidateSpec::Inline(ref rules)) if rules.params.contains_key("id")));
    }

    #[test]
    fn test_configured_route_split() {
        let route: ConfiguredRoute = toml::from_str(
            "method = \"GET\"\npath = \"/alias\"\nhandler = \"BasicHTTP\"\nfunction = \"Test200\"\nauth = false\n",
        )
        .unwrap();

        let (handler, spec) = route.into_spec();
        assert_eq!(handler, "BasicHTTP");
        assert_eq!(spec.handler, "Test200");
        assert_eq!(spec.auth, Some(false));
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("/").is_ok());
        assert!(check_path("/users/{id}/posts/{post_id}").is_ok());
        assert!(check_path("/files/{*rest}").is_ok());

        assert!(check_path("users").is_err());
        assert!(check_path("/users/:id").is_err());
        assert!(check_path("/files/*rest").is_err());
        assert!(check_path("/users/{id").is_err());
        assert!(check_path("/users/id}").is_err());
        assert!(check_path("/users/x{id}").is_err());
        assert!(check_path("/users/{}").is_err());
        assert!(check_path("/files/{*rest}/meta").is_err());
        assert!(check_path("/a/{id}/b/{id}").is_err());
    }

    #[test]
    fn test_path_shape() {
        assert_eq!(path_shape("/users/{id}"), path_shape("/users/{name}"));
        assert_eq!(path_shape("/files/{*rest}"), "/files/{*}");
        assert_ne!(path_shape("/users/{id}"), path_shape("/users/me"));
    }
}

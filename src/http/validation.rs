//! Request validation rules.
//!
//! # Responsibilities
//! - Describe expected path params, query params and JSON payload fields
//! - Check an incoming request against those rules before dispatch
//!
//! # Design Decisions
//! - Path and query values are strings; typed rules check that they parse
//! - Unknown keys are allowed
//! - First failure wins, checked in params → query → payload order

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expected type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    #[default]
    Any,
}

impl FieldType {
    fn label(self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Number => "a number",
            FieldType::Integer => "an integer",
            FieldType::Boolean => "a boolean",
            FieldType::Object => "an object",
            FieldType::Array => "an array",
            FieldType::Any => "a value",
        }
    }

    fn accepts_str(self, value: &str) -> bool {
        match self {
            FieldType::String | FieldType::Any => true,
            FieldType::Number => value.parse::<f64>().is_ok(),
            FieldType::Integer => value.parse::<i64>().is_ok(),
            FieldType::Boolean => matches!(value, "true" | "false"),
            FieldType::Object | FieldType::Array => false,
        }
    }

    fn accepts_json(self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

/// Rule for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct FieldRule {
    #[serde(rename = "type", default)]
    pub kind: FieldType,

    #[serde(default)]
    pub required: bool,
}

impl FieldRule {
    pub fn of(kind: FieldType) -> Self {
        Self { kind, required: false }
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn number() -> Self {
        Self::of(FieldType::Number)
    }

    pub fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Which part of the request failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Params,
    Query,
    Payload,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Params => "params",
            Source::Query => "query",
            Source::Payload => "payload",
        }
    }
}

/// A rejected request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub source: Source,
    pub key: String,
    pub message: String,
}

impl ValidationFailure {
    fn missing(source: Source, key: &str) -> Self {
        Self {
            source,
            key: key.to_string(),
            message: format!("\"{}\" is required", key),
        }
    }

    fn wrong_type(source: Source, key: &str, kind: FieldType) -> Self {
        Self {
            source,
            key: key.to_string(),
            message: format!("\"{}\" must be {}", key, kind.label()),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validation rules for one route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ValidationRules {
    pub params: BTreeMap<String, FieldRule>,
    pub query: BTreeMap<String, FieldRule>,
    pub payload: BTreeMap<String, FieldRule>,
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        self.params.insert(key.into(), rule);
        self
    }

    pub fn query(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        self.query.insert(key.into(), rule);
        self
    }

    pub fn payload(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        self.payload.insert(key.into(), rule);
        self
    }

    pub fn check(
        &self,
        params: &HashMap<String, String>,
        query: &HashMap<String, String>,
        payload: Option<&Value>,
    ) -> Result<(), ValidationFailure> {
        check_strings(Source::Params, &self.params, params)?;
        check_strings(Source::Query, &self.query, query)?;
        self.check_payload(payload)
    }

    fn check_payload(&self, payload: Option<&Value>) -> Result<(), ValidationFailure> {
        if self.payload.is_empty() {
            return Ok(());
        }

        let empty = serde_json::Map::new();
        let fields = match payload {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(fields)) => fields,
            Some(_) => return Err(ValidationFailure::wrong_type(Source::Payload, "value", FieldType::Object)),
        };

        for (key, rule) in &self.payload {
            match fields.get(key) {
                None | Some(Value::Null) if rule.required => {
                    return Err(ValidationFailure::missing(Source::Payload, key));
                }
                None | Some(Value::Null) => {}
                Some(value) if !rule.kind.accepts_json(value) => {
                    return Err(ValidationFailure::wrong_type(Source::Payload, key, rule.kind));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn check_strings(
    source: Source,
    rules: &BTreeMap<String, FieldRule>,
    values: &HashMap<String, String>,
) -> Result<(), ValidationFailure> {
    for (key, rule) in rules {
        match values.get(key) {
            None if rule.required => return Err(ValidationFailure::missing(source, key)),
            None => {}
            Some(value) if !rule.kind.accepts_str(value) => {
                return Err(ValidationFailure::wrong_type(source, key, rule.kind));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_params_and_query() {
        let rules = ValidationRules::new()
            .param("id", FieldRule::integer().required())
            .query("verbose", FieldRule::boolean());

        assert!(rules.check(&map(&[("id", "7")]), &map(&[]), None).is_ok());

        let err = rules.check(&map(&[("id", "x")]), &map(&[]), None).unwrap_err();
        assert_eq!(err.source, Source::Params);
        assert_eq!(err.message, "\"id\" must be an integer");

        let err = rules
            .check(&map(&[("id", "7")]), &map(&[("verbose", "yes")]), None)
            .unwrap_err();
        assert_eq!(err.source, Source::Query);
        assert_eq!(err.key, "verbose");
    }

    #[test]
    fn test_payload() {
        let rules = ValidationRules::new()
            .payload("name", FieldRule::string().required())
            .payload("age", FieldRule::number());

        let none = HashMap::new();
        assert!(rules.check(&none, &none, Some(&json!({"name": "ada"}))).is_ok());
        assert!(rules.check(&none, &none, Some(&json!({"name": "ada", "age": 36, "extra": true}))).is_ok());

        let err = rules.check(&none, &none, None).unwrap_err();
        assert_eq!(err.message, "\"name\" is required");

        let err = rules
            .check(&none, &none, Some(&json!({"name": "ada", "age": "old"})))
            .unwrap_err();
        assert_eq!(err.message, "\"age\" must be a number");

        let err = rules.check(&none, &none, Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err.message, "\"value\" must be an object");
    }

    #[test]
    fn test_rules_from_toml() {
        let rules: ValidationRules = toml::from_str(
            r#"
            [payload]
            email = { type = "string", required = true }
            tags = { type = "array" }
            "#,
        )
        .unwrap();

        assert!(rules.payload["email"].required);
        assert_eq!(rules.payload["tags"].kind, FieldType::Array);
        assert!(rules.query.is_empty());
    }
}

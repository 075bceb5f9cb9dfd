//! Schema validation and coercion for path parameters, query parameters and
//! request bodies.
//!
//! Declared shapes are JSON Schemas (`serde_json::Value`), compiled once at
//! route registration into [`SchemaSpec`] values. Path and query parameters
//! always arrive as raw strings; a declared shape is responsible for any
//! coercion (string→integer, string→number, string→boolean) before the
//! schema is evaluated.
//!
//! Two failure kinds are distinguished: [`Error::Parse`] for malformed input
//! (body that is not well-formed JSON, or query parameters present when no
//! query shape is declared) and [`Error::Validation`] for well-formed input
//! rejected by a schema, reported with field-level paths.

use crate::error::Error;
use crate::router::ParamVec;
use crate::server::RequestBody;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A declared input shape: the raw JSON Schema plus its compiled validator.
///
/// Compiled at registration so an invalid schema fails at startup, not on
/// the first request.
#[derive(Clone)]
pub struct SchemaSpec {
    raw: Value,
    compiled: Arc<jsonschema::Validator>,
}

impl SchemaSpec {
    /// Compile a JSON Schema.
    ///
    /// # Panics
    ///
    /// Panics if the schema itself is invalid, a registration-time
    /// configuration error.
    #[must_use]
    pub fn compile(schema: Value) -> Self {
        let compiled = match jsonschema::validator_for(&schema) {
            Ok(v) => Arc::new(v),
            Err(e) => panic!("invalid JSON Schema {schema}: {e}"),
        };
        Self {
            raw: schema,
            compiled,
        }
    }

    /// The raw schema document.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Evaluate an instance, collecting every violation into one
    /// field-level validation error.
    pub fn evaluate(&self, instance: &Value, what: &str) -> Result<(), Error> {
        let details: Vec<String> = self
            .compiled
            .iter_errors(instance)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();
        if details.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "{what} validation failed: {}",
                details.join("; ")
            )))
        }
    }

    /// Declared primitive type of a named property, if the schema spells
    /// one out. Drives string coercion for path/query parameters.
    fn property_type(&self, name: &str) -> Option<&str> {
        self.raw
            .get("properties")
            .and_then(|p| p.get(name))
            .and_then(|s| s.get("type"))
            .and_then(|t| t.as_str())
    }
}

impl std::fmt::Debug for SchemaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSpec").field("raw", &self.raw).finish()
    }
}

/// The default body shape for mutating methods: an empty record.
static EMPTY_RECORD: Lazy<SchemaSpec> = Lazy::new(|| SchemaSpec::compile(json!({ "type": "object" })));

/// The empty-record body schema (`{"type": "object"}`), the default for
/// mutating methods that declare no explicit body shape.
#[must_use]
pub fn empty_record() -> SchemaSpec {
    EMPTY_RECORD.clone()
}

/// Convert a raw string value to the JSON type a schema property declares.
///
/// Falls back to the raw string when no type is declared or the value does
/// not parse, letting the schema report the mismatch with a proper path.
fn coerce_primitive(value: &str, declared: Option<&str>) -> Value {
    match declared {
        Some("integer") => value
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some("number") => value
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some("boolean") => value
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        _ => Value::String(value.to_string()),
    }
}

/// Validate and coerce extracted path parameters against the route's
/// declared path shape.
///
/// With no declared shape the parameters pass through as strings; the
/// route builder guarantees parameterized patterns always carry one.
pub fn validate_path_params(
    raw: &ParamVec,
    schema: Option<&SchemaSpec>,
) -> Result<Map<String, Value>, Error> {
    let Some(schema) = schema else {
        return Ok(raw
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect());
    };

    let mut object = Map::with_capacity(raw.len());
    for (name, value) in raw {
        object.insert(
            name.clone(),
            coerce_primitive(value, schema.property_type(name)),
        );
    }
    schema.evaluate(&Value::Object(object.clone()), "path parameter")?;
    Ok(object)
}

/// Validate and coerce raw query parameters against the route's declared
/// query shape.
///
/// Query values always arrive as strings (or absent). If the route declares
/// no query shape, any query parameter on the request is a parse error.
pub fn validate_query(
    raw: &HashMap<String, String>,
    schema: Option<&SchemaSpec>,
) -> Result<Map<String, Value>, Error> {
    let Some(schema) = schema else {
        if raw.is_empty() {
            return Ok(Map::new());
        }
        let mut names: Vec<&str> = raw.keys().map(String::as_str).collect();
        names.sort_unstable();
        return Err(Error::parse(format!(
            "unexpected query parameters: {}",
            names.join(", ")
        )));
    };

    let mut object = Map::with_capacity(raw.len());
    for (name, value) in raw {
        object.insert(
            name.clone(),
            coerce_primitive(value, schema.property_type(name)),
        );
    }
    schema.evaluate(&Value::Object(object.clone()), "query parameter")?;
    Ok(object)
}

/// Validate the request body against a declared body shape.
///
/// A missing body on a mutating route is treated as the empty record `{}`
/// before evaluation, so the default empty-record shape accepts body-less
/// requests while a shape with required fields rejects them by name.
pub fn validate_body(body: &RequestBody, schema: &SchemaSpec) -> Result<Value, Error> {
    let instance = match body {
        RequestBody::Invalid(detail) => {
            return Err(Error::parse(format!("malformed JSON body: {detail}")));
        }
        RequestBody::Empty => Value::Object(Map::new()),
        RequestBody::Json(value) => value.clone(),
    };
    schema.evaluate(&instance, "request body")?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn user_schema() -> SchemaSpec {
        SchemaSpec::compile(json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"],
            "additionalProperties": false
        }))
    }

    #[test]
    fn test_path_params_are_coerced() {
        let raw: ParamVec = smallvec![("id".to_string(), "42".to_string())];
        let params = validate_path_params(&raw, Some(&user_schema())).expect("valid");
        assert_eq!(params["id"], json!(42));
    }

    #[test]
    fn test_path_params_reject_non_numeric() {
        let raw: ParamVec = smallvec![("id".to_string(), "forty-two".to_string())];
        let err = validate_path_params(&raw, Some(&user_schema())).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err}");
    }

    #[test]
    fn test_undeclared_query_params_are_a_parse_error() {
        let mut raw = HashMap::new();
        raw.insert("limit".to_string(), "10".to_string());
        let err = validate_query(&raw, None).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err}");
        assert!(err.message().contains("limit"));
    }

    #[test]
    fn test_absent_query_without_shape_is_fine() {
        let raw = HashMap::new();
        assert!(validate_query(&raw, None).expect("ok").is_empty());
    }

    #[test]
    fn test_query_coercion_boolean() {
        let schema = SchemaSpec::compile(json!({
            "type": "object",
            "properties": { "debug": { "type": "boolean" } }
        }));
        let mut raw = HashMap::new();
        raw.insert("debug".to_string(), "true".to_string());
        let query = validate_query(&raw, Some(&schema)).expect("valid");
        assert_eq!(query["debug"], json!(true));
    }

    #[test]
    fn test_malformed_body_is_a_parse_error() {
        let body = RequestBody::Invalid("expected value at line 1".to_string());
        let err = validate_body(&body, &empty_record()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err}");
    }

    #[test]
    fn test_missing_body_defaults_to_empty_record() {
        let value = validate_body(&RequestBody::Empty, &empty_record()).expect("valid");
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_missing_required_field_names_the_field() {
        let schema = SchemaSpec::compile(json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }));
        let err = validate_body(&RequestBody::Json(json!({})), &schema).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err}");
        assert!(err.message().contains("name"), "got {}", err.message());
    }
}

#![deny(missing_docs)]

//! # Dialect Adapters
//!
//! Everything that differs between Swagger 2.0, OpenAPI 3.0 and OpenAPI 3.1 sits
//! behind [`DialectAdapter`]. The compilers above it never look at version numbers.
//!
//! - **v2**: `x-nullable`, boolean exclusive bounds, body/formData parameters,
//!   `consumes`/`produces`, `securityDefinitions`, `host`/`basePath`.
//! - **v3_0**: `nullable`, boolean exclusive bounds, `content` maps.
//! - **v3_1**: type arrays, numeric exclusive bounds, `webhooks`.

pub mod v2;
pub mod v3_0;
pub mod v3_1;

use crate::error::AppResult;
use crate::ir::{IrSchema, IrServer, MediaKind, ParameterLocation};
use crate::oas::document::Dialect;
use crate::oas::media::Lookup;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A request body located in an operation, ready for schema compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySource {
    /// Chosen media type.
    pub media_type: String,
    /// Family of the chosen media type.
    pub kind: MediaKind,
    /// The schema to compile (already wrapped with the body description).
    pub schema: Value,
    /// Whether the body must be sent.
    pub required: bool,
}

/// Content of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSource {
    /// Chosen media type.
    pub media_type: String,
    /// Family of the chosen media type.
    pub kind: MediaKind,
    /// Declared schema, if any.
    pub schema: Option<Value>,
}

/// Dialect-specific knowledge used by the schema and operation compilers.
pub trait DialectAdapter: Sync {
    /// The dialect this adapter handles.
    fn dialect(&self) -> Dialect;

    /// Type keywords of a schema, with `"null"` appended when the schema is nullable.
    ///
    /// A schema with `properties` but no `type` is an object.
    fn schema_types(&self, schema: &Map<String, Value>) -> Vec<String>;

    /// Copies bound keywords into `ir`.
    ///
    /// The default handles the boolean form, where `exclusiveMaximum: true`
    /// turns `maximum` into an exclusive bound.
    fn numeric_bounds(&self, schema: &Map<String, Value>, ir: &mut IrSchema) {
        let exclusive = |key: &str| schema.get(key).and_then(Value::as_bool).unwrap_or(false);
        if let Some(max) = schema.get("maximum") {
            if exclusive("exclusiveMaximum") {
                ir.exclusive_maximum = Some(max.clone());
            } else {
                ir.maximum = Some(max.clone());
            }
        }
        if let Some(min) = schema.get("minimum") {
            if exclusive("exclusiveMinimum") {
                ir.exclusive_minimum = Some(min.clone());
            } else {
                ir.minimum = Some(min.clone());
            }
        }
    }

    /// Maps dialect-only type keywords onto standard ones, annotating `ir`.
    fn normalize_type<'k>(&self, keyword: &'k str, _ir: &mut IrSchema) -> &'k str {
        keyword
    }

    /// The value schema of a (non-body) parameter.
    fn parameter_schema(&self, parameter: &Map<String, Value>) -> Option<Value>;

    /// Serialization `(style, explode)` of a parameter.
    fn parameter_style(&self, parameter: &Map<String, Value>, location: ParameterLocation) -> (String, bool) {
        let style = parameter
            .get("style")
            .and_then(Value::as_str)
            .unwrap_or_else(|| location.default_style())
            .to_string();
        let explode = parameter
            .get("explode")
            .and_then(Value::as_bool)
            .unwrap_or(style == "form");
        (style, explode)
    }

    /// Locates the request body of an operation.
    ///
    /// # Arguments
    ///
    /// * `root` - The whole document, for `$ref` resolution.
    /// * `operation` - The operation object.
    /// * `parameters` - The operation's merged, resolved parameters.
    fn request_body(
        &self,
        root: &Value,
        operation: &Map<String, Value>,
        parameters: &[Map<String, Value>],
    ) -> AppResult<Lookup<BodySource>>;

    /// Locates the content of one (resolved) response.
    fn response_content(
        &self,
        root: &Value,
        operation: &Map<String, Value>,
        response: &Map<String, Value>,
    ) -> Lookup<ContentSource>;

    /// Declared security schemes, normalised to the V3 shape.
    fn security_schemes(&self, root: &Value) -> IndexMap<String, Value>;

    /// Declared servers.
    fn servers(&self, root: &Value) -> Vec<IrServer>;

    /// Webhook path items, where the dialect has them.
    fn webhooks<'r>(&self, _root: &'r Value) -> Option<&'r Map<String, Value>> {
        None
    }

    /// Reusable parameters.
    fn component_parameters<'r>(&self, root: &'r Value) -> Option<&'r Map<String, Value>>;

    /// Pointer prefix of reusable parameters.
    fn parameters_pointer_prefix(&self) -> &'static str;

    /// Reusable request bodies, where the dialect has them.
    fn component_request_bodies<'r>(&self, _root: &'r Value) -> Option<&'r Map<String, Value>> {
        None
    }
}

/// The adapter for `dialect`.
pub fn adapter_for(dialect: Dialect) -> &'static dyn DialectAdapter {
    match dialect {
        Dialect::V2 => &v2::SwaggerAdapter,
        Dialect::V3_0 => &v3_0::OpenApi30Adapter,
        Dialect::V3_1 => &v3_1::OpenApi31Adapter,
    }
}

/// Reads `root[a][b]...` as a map.
pub(crate) fn map_at<'r>(root: &'r Value, path: &[&str]) -> Option<&'r Map<String, Value>> {
    let mut current = root;
    for segment in path {
        current = current.get(*segment)?;
    }
    current.as_object()
}

/// Wraps a content schema with its container description.
///
/// A `$ref` schema is kept intact inside a one-branch `allOf` so the
/// reference survives; anything else gets the description spread over it.
pub(crate) fn describe_schema(schema: &Value, description: Option<&Value>) -> Value {
    let mut wrapper = Map::new();
    if let Some(d) = description {
        wrapper.insert("description".into(), d.clone());
    }
    if schema.get("$ref").is_some() {
        wrapper.insert("allOf".into(), Value::Array(vec![schema.clone()]));
        return Value::Object(wrapper);
    }
    match schema {
        Value::Object(map) => {
            for (key, value) in map {
                wrapper.insert(key.clone(), value.clone());
            }
            Value::Object(wrapper)
        }
        other => other.clone(),
    }
}

/// Type list shared by the dialects whose `type` is a single string.
pub(crate) fn single_type_with_flag(schema: &Map<String, Value>, nullable_key: &str) -> Vec<String> {
    let mut types = Vec::new();
    match schema.get("type").and_then(Value::as_str) {
        Some(ty) => types.push(ty.to_string()),
        None if schema.contains_key("properties") => types.push("object".to_string()),
        None => {}
    }
    let nullable = schema.get(nullable_key).and_then(Value::as_bool).unwrap_or(false);
    if nullable && !types.iter().any(|t| t == "null") {
        types.push("null".to_string());
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_schema_keeps_ref_in_all_of() {
        let wrapped = describe_schema(&json!({"$ref": "#/components/schemas/Pet"}), Some(&json!("A pet")));
        assert_eq!(
            wrapped,
            json!({"description": "A pet", "allOf": [{"$ref": "#/components/schemas/Pet"}]})
        );
        let spread = describe_schema(&json!({"type": "string", "description": "inner"}), Some(&json!("outer")));
        assert_eq!(spread["description"], "inner");
    }

    #[test]
    fn test_adapter_for_dialect() {
        assert_eq!(adapter_for(Dialect::V2).dialect(), Dialect::V2);
        assert_eq!(adapter_for(Dialect::V3_1).dialect(), Dialect::V3_1);
    }

    #[test]
    fn test_default_bounds_are_boolean_flags() {
        let schema = json!({"maximum": 10, "exclusiveMaximum": true, "minimum": 1});
        let mut ir = IrSchema::default();
        adapter_for(Dialect::V3_0).numeric_bounds(schema.as_object().unwrap(), &mut ir);
        assert_eq!(ir.exclusive_maximum, Some(json!(10)));
        assert_eq!(ir.maximum, None);
        assert_eq!(ir.minimum, Some(json!(1)));
    }
}

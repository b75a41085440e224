#![deny(missing_docs)]

//! # Pagination Inference
//!
//! A parameter whose name is a pagination keyword is a pagination control. A
//! body is paginated when one of its *immediate* scalar properties is named
//! after a keyword. `$ref`s and `allOf` members are followed to find those
//! properties, nested objects are not.

use crate::ir::BodyPagination;
use crate::oas::dialects::DialectAdapter;
use crate::oas::media::{select_content, Lookup};
use crate::oas::ref_utils::{ref_of, resolve};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const SCALAR_TYPES: [&str; 4] = ["boolean", "integer", "number", "string"];

/// Looks for a pagination marker on `name` / `schema`.
pub struct PaginationDetector<'a> {
    root: &'a Value,
    adapter: &'a dyn DialectAdapter,
    keywords: Option<&'a Regex>,
}

impl<'a> PaginationDetector<'a> {
    /// A detector; `keywords` of `None` disables detection.
    pub fn new(root: &'a Value, adapter: &'a dyn DialectAdapter, keywords: Option<&'a Regex>) -> Self {
        Self { root, adapter, keywords }
    }

    fn is_keyword(&self, name: &str) -> bool {
        self.keywords.is_some_and(|re| re.is_match(name))
    }

    /// `Whole(true)` when `name` itself is a keyword, `Field` for the first
    /// keyword property, `None` otherwise.
    pub fn detect(&self, name: &str, schema: &Value) -> Option<BodyPagination> {
        if self.keywords.is_none() {
            return None;
        }
        if self.is_keyword(name) {
            return Some(BodyPagination::Whole(true));
        }
        let mut visited = HashSet::new();
        self.field_in(schema, &mut visited).map(BodyPagination::Field)
    }

    /// Whether a parameter called `name` with value `schema` is a pagination control.
    ///
    /// The schema, after following `$ref`s, must be scalar or untyped.
    pub fn is_parameter(&self, name: &str, schema: &Value) -> bool {
        if !self.is_keyword(name) {
            return false;
        }
        let mut schema = schema;
        let mut visited = HashSet::new();
        while let Some(pointer) = ref_of(schema) {
            if !visited.insert(pointer) {
                return false;
            }
            match resolve(self.root, pointer) {
                Ok(target) => schema = target,
                Err(_) => return true,
            }
        }
        let Some(map) = schema.as_object() else {
            return true;
        };
        let types = self.adapter.schema_types(map);
        types
            .iter()
            .find(|t| *t != "null")
            .map_or(true, |t| SCALAR_TYPES.contains(&t.as_str()))
    }

    fn field_in(&self, schema: &Value, visited: &mut HashSet<String>) -> Option<String> {
        if let Some(pointer) = ref_of(schema) {
            if !visited.insert(pointer.to_string()) {
                return None;
            }
            let target = resolve(self.root, pointer).ok()?;
            return self.field_in(schema_of(target).unwrap_or(target), visited);
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                if self.is_keyword(name) && ref_of(property).is_none() && self.is_scalar(property) {
                    return Some(name.clone());
                }
            }
        }

        schema
            .get("allOf")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find_map(|member| self.field_in(member, visited))
    }

    /// Scalar type, or a union with exactly one non-null scalar branch.
    fn is_scalar(&self, property: &Value) -> bool {
        let Some(map) = property.as_object() else {
            return false;
        };
        let types = self.adapter.schema_types(map);
        if let Some(first) = types.iter().find(|t| *t != "null") {
            return SCALAR_TYPES.contains(&first.as_str());
        }
        let branches = map
            .get("anyOf")
            .or_else(|| map.get("oneOf"))
            .and_then(Value::as_array);
        let non_null: Vec<&Value> = branches
            .into_iter()
            .flatten()
            .filter(|b| b.get("type").and_then(Value::as_str) != Some("null"))
            .collect();
        match non_null.as_slice() {
            [only] => self.is_scalar(only),
            _ => false,
        }
    }
}

/// The content schema of a request-body object, if `node` is one.
fn schema_of(node: &Value) -> Option<&Value> {
    let content = node.get("content")?.as_object()?;
    match select_content(content) {
        Lookup::Found((_, _, object)) => object.get("schema"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::oas::dialects::adapter_for;
    use crate::oas::document::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn detect(root: &Value, name: &str, schema: Value) -> Option<BodyPagination> {
        let re = PaginationConfig::default().matcher().unwrap().unwrap();
        PaginationDetector::new(root, adapter_for(Dialect::V3_1), Some(&re)).detect(name, &schema)
    }

    #[test]
    fn test_parameter_name_is_keyword() {
        assert_eq!(detect(&json!({}), "cursor", json!({"type": "string"})), Some(BodyPagination::Whole(true)));
        assert_eq!(detect(&json!({}), "cursorId", json!({"type": "string"})), None);
    }

    #[test]
    fn test_immediate_property_detected() {
        let schema = json!({"type": "object", "properties": {
            "filter": {"type": "string"},
            "page": {"type": "integer"}
        }});
        assert_eq!(detect(&json!({}), "", schema), Some(BodyPagination::Field("page".into())));
    }

    #[test]
    fn test_nested_property_not_detected() {
        let schema = json!({"type": "object", "properties": {
            "query": {"type": "object", "properties": {"page": {"type": "integer"}}}
        }});
        assert_eq!(detect(&json!({}), "", schema), None);
    }

    #[test]
    fn test_follows_refs_and_all_of() {
        let root = json!({"components": {"schemas": {
            "Paging": {"type": "object", "properties": {"offset": {"type": ["integer", "null"]}}}
        }}});
        let schema = json!({"allOf": [{"$ref": "#/components/schemas/Paging"}]});
        assert_eq!(detect(&root, "", schema), Some(BodyPagination::Field("offset".into())));
    }

    #[test]
    fn test_single_non_null_branch_counts() {
        let schema = json!({"properties": {"after": {"anyOf": [{"type": "string"}, {"type": "null"}]}}});
        assert_eq!(detect(&json!({}), "", schema), Some(BodyPagination::Field("after".into())));
    }

    #[test]
    fn test_parameter_must_be_scalar_or_untyped() {
        let re = PaginationConfig::default().matcher().unwrap().unwrap();
        let detector = PaginationDetector::new(&Value::Null, adapter_for(Dialect::V3_1), Some(&re));
        assert!(detector.is_parameter("page", &json!({"type": "integer"})));
        assert!(detector.is_parameter("cursor", &json!({})));
        assert!(!detector.is_parameter("page", &json!({"type": "object"})));
        assert!(!detector.is_parameter("limit", &json!({"type": "integer"})));
    }

    #[test]
    fn test_parameter_schema_refs_are_followed() {
        let root = json!({"components": {"schemas": {
            "PageNumber": {"$ref": "#/components/schemas/Int"},
            "Int": {"type": "integer"},
            "Window": {"type": "object", "properties": {"from": {"type": "integer"}}},
            "Loop": {"$ref": "#/components/schemas/Loop"}
        }}});
        let re = PaginationConfig::default().matcher().unwrap().unwrap();
        let detector = PaginationDetector::new(&root, adapter_for(Dialect::V3_1), Some(&re));
        assert!(detector.is_parameter("page", &json!({"$ref": "#/components/schemas/PageNumber"})));
        assert!(!detector.is_parameter("page", &json!({"$ref": "#/components/schemas/Window"})));
        assert!(!detector.is_parameter("page", &json!({"$ref": "#/components/schemas/Loop"})));
    }

    #[test]
    fn test_disabled_without_keywords() {
        let detector = PaginationDetector::new(&Value::Null, adapter_for(Dialect::V3_1), None);
        assert_eq!(detector.detect("page", &json!({})), None);
    }
}

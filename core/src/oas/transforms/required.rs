#![deny(missing_docs)]

//! # Properties Required By Default
//!
//! Marks every declared property required on objects that omit `required`.

use crate::oas::document::Document;
use crate::oas::transforms::for_each_schema_mut;
use serde_json::Value;

/// Sets `required` to all property names on every schema that declares
/// `properties` but no `required` list. Returns how many schemas changed.
pub fn require_all_properties(document: &mut Document) -> usize {
    let dialect = document.dialect();
    let mut changed = 0;
    for_each_schema_mut(document.root_mut(), dialect, &mut |schema| {
        if schema.contains_key("required") {
            return;
        }
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return;
        };
        if properties.is_empty() {
            return;
        }
        let names: Vec<Value> = properties.keys().map(|k| Value::String(k.clone())).collect();
        schema.insert("required".to_string(), Value::Array(names));
        changed += 1;
    });
    tracing::debug!(changed, "properties marked required");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_objects_without_required_change() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.0.3",
            "components": {"schemas": {
                "Pet": {"type": "object", "properties": {
                    "name": {"type": "string"},
                    "owner": {"type": "object", "properties": {"id": {"type": "integer"}}}
                }},
                "Tag": {"type": "object", "required": [], "properties": {"label": {"type": "string"}}}
            }}
        }))
        .unwrap();
        assert_eq!(require_all_properties(&mut doc), 2);
        let schemas = &doc.root()["components"]["schemas"];
        assert_eq!(schemas["Pet"]["required"], json!(["name", "owner"]));
        assert_eq!(schemas["Pet"]["properties"]["owner"]["required"], json!(["id"]));
        assert_eq!(schemas["Tag"]["required"], json!([]));
    }
}

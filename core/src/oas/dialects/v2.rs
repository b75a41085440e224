#![deny(missing_docs)]

//! # Swagger 2.0
//!
//! Parameters carry their own type keywords, bodies live in `in: body` or
//! `in: formData` parameters, and media types come from `consumes` / `produces`.

use crate::error::AppResult;
use crate::ir::{IrSchema, IrServer, MediaKind, ParameterLocation};
use crate::oas::dialects::{describe_schema, map_at, single_type_with_flag, BodySource, ContentSource, DialectAdapter};
use crate::oas::document::Dialect;
use crate::oas::media::{select_type, Lookup};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Parameter keys that describe the parameter rather than its value.
const PARAMETER_ONLY_KEYS: [&str; 7] = [
    "name",
    "in",
    "required",
    "description",
    "collectionFormat",
    "allowEmptyValue",
    "schema",
];

/// Adapter for Swagger 2.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwaggerAdapter;

impl DialectAdapter for SwaggerAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::V2
    }

    fn schema_types(&self, schema: &Map<String, Value>) -> Vec<String> {
        single_type_with_flag(schema, "x-nullable")
    }

    fn normalize_type<'k>(&self, keyword: &'k str, ir: &mut IrSchema) -> &'k str {
        if keyword == "file" {
            ir.format = Some("binary".into());
            return "string";
        }
        keyword
    }

    fn parameter_schema(&self, parameter: &Map<String, Value>) -> Option<Value> {
        if let Some(schema) = parameter.get("schema") {
            return Some(schema.clone());
        }
        let schema: Map<String, Value> = parameter
            .iter()
            .filter(|(key, _)| !PARAMETER_ONLY_KEYS.contains(&key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Value::Object(schema))
    }

    fn parameter_style(&self, parameter: &Map<String, Value>, location: ParameterLocation) -> (String, bool) {
        let format = parameter.get("collectionFormat").and_then(Value::as_str);
        let (style, explode) = match format {
            Some("multi") => ("form", true),
            Some("ssv") => ("spaceDelimited", false),
            Some("pipes") => ("pipeDelimited", false),
            _ => (location.default_style(), false),
        };
        (style.to_string(), explode)
    }

    fn request_body(
        &self,
        root: &Value,
        operation: &Map<String, Value>,
        parameters: &[Map<String, Value>],
    ) -> AppResult<Lookup<BodySource>> {
        let location = |p: &Map<String, Value>| p.get("in").and_then(Value::as_str).map(str::to_string);

        if let Some(body) = parameters.iter().find(|p| location(p).as_deref() == Some("body")) {
            let consumes = media_types(root, operation, "consumes");
            let (media_type, kind) = match consumes {
                Some(types) => match select_type(types.iter().map(String::as_str)) {
                    Lookup::Found(found) => found,
                    Lookup::Unsupported(skipped) => return Ok(Lookup::Unsupported(skipped)),
                    Lookup::Absent => json_default(),
                },
                None => json_default(),
            };
            let schema = body.get("schema").cloned().unwrap_or_else(|| json!({}));
            return Ok(Lookup::Found(BodySource {
                media_type,
                kind,
                schema: describe_schema(&schema, body.get("description")),
                required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
            }));
        }

        let fields: Vec<&Map<String, Value>> = parameters
            .iter()
            .filter(|p| location(p).as_deref() == Some("formData"))
            .collect();
        if fields.is_empty() {
            return Ok(Lookup::Absent);
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut has_file = false;
        for field in &fields {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                continue;
            };
            has_file |= field.get("type").and_then(Value::as_str) == Some("file");
            let mut schema = self.parameter_schema(field).unwrap_or_else(|| json!({}));
            if let (Some(map), Some(d)) = (schema.as_object_mut(), field.get("description")) {
                map.insert("description".into(), d.clone());
            }
            properties.insert(name.to_string(), schema);
            if field.get("required").and_then(Value::as_bool).unwrap_or(false) {
                required.push(Value::String(name.to_string()));
            }
        }

        let consumes = media_types(root, operation, "consumes").unwrap_or_default();
        let multipart = has_file || consumes.iter().any(|t| t.starts_with("multipart/form-data"));
        let (media_type, kind) = if multipart {
            ("multipart/form-data".to_string(), MediaKind::FormData)
        } else {
            ("application/x-www-form-urlencoded".to_string(), MediaKind::UrlSearchParams)
        };

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        let any_required = !required.is_empty();
        if any_required {
            schema.insert("required".into(), Value::Array(required));
        }
        Ok(Lookup::Found(BodySource {
            media_type,
            kind,
            schema: Value::Object(schema),
            required: any_required,
        }))
    }

    fn response_content(
        &self,
        root: &Value,
        operation: &Map<String, Value>,
        response: &Map<String, Value>,
    ) -> Lookup<ContentSource> {
        let Some(schema) = response.get("schema") else {
            return Lookup::Absent;
        };
        let (media_type, kind) = match media_types(root, operation, "produces") {
            Some(types) => match select_type(types.iter().map(String::as_str)) {
                Lookup::Found(found) => found,
                Lookup::Unsupported(skipped) => return Lookup::Unsupported(skipped),
                Lookup::Absent => json_default(),
            },
            None => json_default(),
        };
        Lookup::Found(ContentSource {
            media_type,
            kind,
            schema: Some(schema.clone()),
        })
    }

    fn security_schemes(&self, root: &Value) -> IndexMap<String, Value> {
        map_at(root, &["securityDefinitions"])
            .map(|defs| {
                defs.iter()
                    .filter_map(|(name, def)| Some((name.clone(), convert_security_definition(def)?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn servers(&self, root: &Value) -> Vec<IrServer> {
        let host = root.get("host").and_then(Value::as_str);
        let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");
        let Some(host) = host else {
            if base_path.is_empty() {
                return Vec::new();
            }
            return vec![IrServer {
                url: base_path.to_string(),
                description: None,
            }];
        };
        let schemes: Vec<&str> = root
            .get("schemes")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).collect())
            .filter(|s: &Vec<&str>| !s.is_empty())
            .unwrap_or_else(|| vec!["https"]);
        schemes
            .into_iter()
            .map(|scheme| IrServer {
                url: format!("{scheme}://{host}{base_path}"),
                description: None,
            })
            .collect()
    }

    fn component_parameters<'r>(&self, root: &'r Value) -> Option<&'r Map<String, Value>> {
        map_at(root, &["parameters"])
    }

    fn parameters_pointer_prefix(&self) -> &'static str {
        "#/parameters/"
    }
}

fn json_default() -> (String, MediaKind) {
    ("application/json".to_string(), MediaKind::Json)
}

/// Operation-level `consumes`/`produces`, falling back to the document-level list.
fn media_types(root: &Value, operation: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    operation
        .get(key)
        .or_else(|| root.get(key))
        .and_then(Value::as_array)
        .map(|types| types.iter().filter_map(Value::as_str).map(str::to_string).collect())
}

/// Converts a `securityDefinitions` entry into the V3 security scheme shape.
fn convert_security_definition(def: &Value) -> Option<Value> {
    let mut scheme = match def.get("type")?.as_str()? {
        "basic" => json!({"type": "http", "scheme": "basic"}),
        "apiKey" => json!({
            "type": "apiKey",
            "name": def.get("name").cloned().unwrap_or(Value::Null),
            "in": def.get("in").cloned().unwrap_or(Value::Null),
        }),
        "oauth2" => {
            let flow_name = match def.get("flow").and_then(Value::as_str)? {
                "implicit" => "implicit",
                "password" => "password",
                "application" => "clientCredentials",
                "accessCode" => "authorizationCode",
                _ => return None,
            };
            let mut flow = Map::new();
            for key in ["authorizationUrl", "tokenUrl"] {
                if let Some(url) = def.get(key) {
                    flow.insert(key.to_string(), url.clone());
                }
            }
            flow.insert(
                "scopes".into(),
                def.get("scopes").cloned().unwrap_or_else(|| json!({})),
            );
            json!({"type": "oauth2", "flows": {flow_name: flow}})
        }
        _ => return None,
    };
    if let (Some(map), Some(d)) = (scheme.as_object_mut(), def.get("description")) {
        map.insert("description".into(), d.clone());
    }
    Some(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(values: Value) -> Vec<Map<String, Value>> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_x_nullable() {
        let schema = json!({"type": "string", "x-nullable": true});
        assert_eq!(
            SwaggerAdapter.schema_types(schema.as_object().unwrap()),
            vec!["string", "null"]
        );
    }

    #[test]
    fn test_file_type_becomes_binary_string() {
        let mut ir = IrSchema::default();
        assert_eq!(SwaggerAdapter.normalize_type("file", &mut ir), "string");
        assert_eq!(ir.format.as_deref(), Some("binary"));
    }

    #[test]
    fn test_parameter_schema_from_own_keys() {
        let param = json!({
            "name": "limit", "in": "query", "required": true,
            "type": "integer", "format": "int32", "maximum": 100
        });
        assert_eq!(
            SwaggerAdapter.parameter_schema(param.as_object().unwrap()),
            Some(json!({"type": "integer", "format": "int32", "maximum": 100}))
        );
    }

    #[test]
    fn test_collection_formats() {
        let multi = json!({"name": "tag", "in": "query", "collectionFormat": "multi"});
        assert_eq!(
            SwaggerAdapter.parameter_style(multi.as_object().unwrap(), ParameterLocation::Query),
            ("form".to_string(), true)
        );
        let csv = json!({"name": "tag", "in": "query", "collectionFormat": "csv"});
        assert_eq!(
            SwaggerAdapter.parameter_style(csv.as_object().unwrap(), ParameterLocation::Query),
            ("form".to_string(), false)
        );
        let pipes = json!({"name": "tag", "in": "query", "collectionFormat": "pipes"});
        assert_eq!(
            SwaggerAdapter.parameter_style(pipes.as_object().unwrap(), ParameterLocation::Query).0,
            "pipeDelimited"
        );
    }

    #[test]
    fn test_body_parameter() {
        let root = json!({"consumes": ["application/json"]});
        let op = json!({});
        let ps = params(json!([
            {"name": "pet", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}}
        ]));
        let Lookup::Found(body) = SwaggerAdapter.request_body(&root, op.as_object().unwrap(), &ps).unwrap() else {
            panic!("body expected");
        };
        assert!(body.required);
        assert_eq!(body.schema, json!({"allOf": [{"$ref": "#/definitions/Pet"}]}));
    }

    #[test]
    fn test_form_data_parameters_become_object() {
        let ps = params(json!([
            {"name": "file", "in": "formData", "type": "file", "required": true},
            {"name": "note", "in": "formData", "type": "string"}
        ]));
        let Lookup::Found(body) = SwaggerAdapter.request_body(&json!({}), &Map::new(), &ps).unwrap() else {
            panic!("body expected");
        };
        assert_eq!(body.kind, MediaKind::FormData);
        assert_eq!(body.schema["required"], json!(["file"]));
        assert_eq!(body.schema["properties"]["note"]["type"], "string");
    }

    #[test]
    fn test_response_uses_produces() {
        let op = json!({"produces": ["application/xml", "text/plain"]});
        let response = json!({"description": "ok", "schema": {"type": "string"}});
        let Lookup::Found(content) =
            SwaggerAdapter.response_content(&json!({}), op.as_object().unwrap(), response.as_object().unwrap())
        else {
            panic!("content expected");
        };
        assert_eq!(content.media_type, "text/plain");
    }

    #[test]
    fn test_security_definitions_converted() {
        let root = json!({"securityDefinitions": {
            "basicAuth": {"type": "basic"},
            "key": {"type": "apiKey", "name": "X-Key", "in": "header"},
            "oauth": {"type": "oauth2", "flow": "accessCode",
                      "authorizationUrl": "https://a", "tokenUrl": "https://t", "scopes": {"read": "r"}}
        }});
        let schemes = SwaggerAdapter.security_schemes(&root);
        assert_eq!(schemes["basicAuth"], json!({"type": "http", "scheme": "basic"}));
        assert_eq!(schemes["key"]["in"], "header");
        assert_eq!(schemes["oauth"]["flows"]["authorizationCode"]["tokenUrl"], "https://t");
    }

    #[test]
    fn test_servers_from_host() {
        let root = json!({"host": "api.example.com", "basePath": "/v1", "schemes": ["http", "https"]});
        let urls: Vec<String> = SwaggerAdapter.servers(&root).into_iter().map(|s| s.url).collect();
        assert_eq!(urls, vec!["http://api.example.com/v1", "https://api.example.com/v1"]);
        assert!(SwaggerAdapter.servers(&json!({})).is_empty());
    }
}

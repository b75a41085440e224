#![deny(missing_docs)]

//! # OpenAPI 3.0
//!
//! `nullable` flag, boolean exclusive bounds and `content` maps.
//! The helpers here are shared with 3.1, which only differs in schema keywords.

use crate::error::AppResult;
use crate::ir::IrServer;
use crate::oas::dialects::{describe_schema, map_at, single_type_with_flag, BodySource, ContentSource, DialectAdapter};
use crate::oas::document::Dialect;
use crate::oas::media::{select_content, Lookup};
use crate::oas::ref_utils::{ref_of, resolve_object};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Adapter for OpenAPI 3.0.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi30Adapter;

impl DialectAdapter for OpenApi30Adapter {
    fn dialect(&self) -> Dialect {
        Dialect::V3_0
    }

    fn schema_types(&self, schema: &Map<String, Value>) -> Vec<String> {
        single_type_with_flag(schema, "nullable")
    }

    fn parameter_schema(&self, parameter: &Map<String, Value>) -> Option<Value> {
        v3_parameter_schema(parameter)
    }

    fn request_body(
        &self,
        root: &Value,
        operation: &Map<String, Value>,
        _parameters: &[Map<String, Value>],
    ) -> AppResult<Lookup<BodySource>> {
        v3_request_body(root, operation)
    }

    fn response_content(
        &self,
        _root: &Value,
        _operation: &Map<String, Value>,
        response: &Map<String, Value>,
    ) -> Lookup<ContentSource> {
        v3_response_content(response)
    }

    fn security_schemes(&self, root: &Value) -> IndexMap<String, Value> {
        v3_security_schemes(root)
    }

    fn servers(&self, root: &Value) -> Vec<IrServer> {
        v3_servers(root)
    }

    fn component_parameters<'r>(&self, root: &'r Value) -> Option<&'r Map<String, Value>> {
        map_at(root, &["components", "parameters"])
    }

    fn parameters_pointer_prefix(&self) -> &'static str {
        "#/components/parameters/"
    }

    fn component_request_bodies<'r>(&self, root: &'r Value) -> Option<&'r Map<String, Value>> {
        map_at(root, &["components", "requestBodies"])
    }
}

/// `schema`, or the schema of the first usable `content` entry.
pub(crate) fn v3_parameter_schema(parameter: &Map<String, Value>) -> Option<Value> {
    if let Some(schema) = parameter.get("schema") {
        return Some(schema.clone());
    }
    let content = parameter.get("content")?.as_object()?;
    match select_content(content) {
        Lookup::Found((_, _, object)) => object.get("schema").cloned(),
        _ => content.values().find_map(|object| object.get("schema").cloned()),
    }
}

/// Body of a V3 operation.
///
/// A `$ref` body stays a reference to the request-body component, wrapped in a
/// one-branch `allOf`; an inline body compiles its chosen content schema.
pub(crate) fn v3_request_body(root: &Value, operation: &Map<String, Value>) -> AppResult<Lookup<BodySource>> {
    let Some(node) = operation.get("requestBody") else {
        return Ok(Lookup::Absent);
    };
    let body = resolve_object(root, node)?;
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Ok(Lookup::Absent);
    };
    let (media_type, kind, object) = match select_content(content) {
        Lookup::Found(found) => found,
        Lookup::Unsupported(types) => return Ok(Lookup::Unsupported(types)),
        Lookup::Absent => return Ok(Lookup::Absent),
    };
    let description = node.get("description").or_else(|| body.get("description"));
    let schema = match ref_of(node) {
        Some(pointer) => describe_schema(&json!({"$ref": pointer}), description),
        None => match object.get("schema") {
            Some(schema) => describe_schema(schema, description),
            None => describe_schema(&json!({}), description),
        },
    };
    let required = node
        .get("required")
        .or_else(|| body.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(Lookup::Found(BodySource {
        media_type,
        kind,
        schema,
        required,
    }))
}

pub(crate) fn v3_response_content(response: &Map<String, Value>) -> Lookup<ContentSource> {
    let Some(content) = response.get("content").and_then(Value::as_object) else {
        return Lookup::Absent;
    };
    match select_content(content) {
        Lookup::Found((media_type, kind, object)) => Lookup::Found(ContentSource {
            media_type,
            kind,
            schema: object.get("schema").cloned(),
        }),
        Lookup::Unsupported(types) => Lookup::Unsupported(types),
        Lookup::Absent => Lookup::Absent,
    }
}

pub(crate) fn v3_security_schemes(root: &Value) -> IndexMap<String, Value> {
    map_at(root, &["components", "securitySchemes"])
        .map(|schemes| {
            schemes
                .iter()
                .filter_map(|(name, scheme)| {
                    let resolved = match ref_of(scheme) {
                        Some(_) => resolve_object(root, scheme).ok().map(|m| Value::Object(m.clone()))?,
                        None => scheme.clone(),
                    };
                    Some((name.clone(), resolved))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn v3_servers(root: &Value) -> Vec<IrServer> {
    root.get("servers")
        .and_then(Value::as_array)
        .map(|servers| {
            servers
                .iter()
                .filter_map(|server| {
                    Some(IrServer {
                        url: server.get("url")?.as_str()?.to_string(),
                        description: server
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

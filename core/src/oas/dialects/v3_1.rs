#![deny(missing_docs)]

//! # OpenAPI 3.1
//!
//! JSON Schema 2020-12 keywords: `type` arrays, numeric `exclusiveMaximum` /
//! `exclusiveMinimum`, and top-level `webhooks`.

use crate::error::AppResult;
use crate::ir::{IrSchema, IrServer};
use crate::oas::dialects::v3_0::{
    v3_parameter_schema, v3_request_body, v3_response_content, v3_security_schemes, v3_servers,
};
use crate::oas::dialects::{map_at, BodySource, ContentSource, DialectAdapter};
use crate::oas::document::Dialect;
use crate::oas::media::Lookup;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Adapter for OpenAPI 3.1.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi31Adapter;

impl DialectAdapter for OpenApi31Adapter {
    fn dialect(&self) -> Dialect {
        Dialect::V3_1
    }

    fn schema_types(&self, schema: &Map<String, Value>) -> Vec<String> {
        match schema.get("type") {
            Some(Value::String(ty)) => vec![ty.clone()],
            Some(Value::Array(types)) => {
                let mut out: Vec<String> = Vec::with_capacity(types.len());
                for ty in types.iter().filter_map(Value::as_str) {
                    if !out.iter().any(|t| t == ty) {
                        out.push(ty.to_string());
                    }
                }
                out
            }
            _ if schema.contains_key("properties") => vec!["object".to_string()],
            _ => Vec::new(),
        }
    }

    fn numeric_bounds(&self, schema: &Map<String, Value>, ir: &mut IrSchema) {
        let number = |key: &str| schema.get(key).filter(|v| v.is_number()).cloned();
        ir.maximum = number("maximum");
        ir.minimum = number("minimum");
        ir.exclusive_maximum = number("exclusiveMaximum");
        ir.exclusive_minimum = number("exclusiveMinimum");
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

    fn webhooks<'r>(&self, root: &'r Value) -> Option<&'r Map<String, Value>> {
        map_at(root, &["webhooks"])
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

#![deny(missing_docs)]

//! # Components
//!
//! Compiles the reusable parts of a document: named schemas, parameters and
//! request bodies.

use crate::error::AppResult;
use crate::ir::IrComponents;
use crate::oas::dialects::map_at;
use crate::oas::ref_utils::{encode_pointer_segment, resolve_object};
use crate::oas::routes::builder::OperationCompiler;
use crate::oas::schemas::CompileState;
use serde_json::Map;

/// Compiles every reusable component of the document bound to `compiler`.
///
/// Each named schema is compiled with the walk seeded by its own pointer, so a
/// schema that refers to itself stays a reference.
pub fn compile_components(compiler: &OperationCompiler<'_>, state: &mut CompileState) -> AppResult<IrComponents> {
    let root = compiler.root;
    let dialect = compiler.adapter.dialect();
    let mut components = IrComponents::default();

    if let Some(schemas) = map_at(root, dialect.schemas_path()) {
        for (name, schema) in schemas {
            let pointer = format!("{}{}", dialect.schemas_pointer_prefix(), encode_pointer_segment(name));
            let compiled = compiler.schemas().compile_component(&pointer, schema, state)?;
            components.schemas.insert(name.clone(), compiled);
        }
    }

    if let Some(parameters) = compiler.adapter.component_parameters(root) {
        for (name, node) in parameters {
            let param = resolve_object(root, node)?;
            if let Some(compiled) = compiler.compile_parameter(param, state)? {
                components.parameters.insert(name.clone(), compiled);
            }
        }
    }

    if let Some(bodies) = compiler.adapter.component_request_bodies(root) {
        for (name, node) in bodies {
            let mut holder = Map::new();
            holder.insert("requestBody".to_string(), node.clone());
            let location = format!("#/components/requestBodies/{}", encode_pointer_segment(name));
            if let Some(body) = compiler.compile_body(&holder, &[], &location, state)? {
                components.request_bodies.insert(name.clone(), body);
            }
        }
    }

    tracing::debug!(
        schemas = components.schemas.len(),
        parameters = components.parameters.len(),
        request_bodies = components.request_bodies.len(),
        "components compiled"
    );
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MediaKind, ParameterLocation, SchemaType};
    use crate::oas::routes::builder::test_support::with_compiler;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_v3_components() {
        let root = json!({
            "openapi": "3.0.3",
            "components": {
                "schemas": {
                    "Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}},
                    "Name": {"type": "string"}
                },
                "parameters": {
                    "Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                },
                "requestBodies": {
                    "NodeBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Node"}}}}
                }
            }
        });
        with_compiler(&root, |compiler| {
            let mut state = CompileState::new();
            let components = compile_components(compiler, &mut state).unwrap();

            assert_eq!(components.schemas.keys().collect::<Vec<_>>(), vec!["Node", "Name"]);
            let next = &components.schemas["Node"].properties["next"];
            assert_eq!(next.reference.as_deref(), Some("#/components/schemas/Node"));

            let limit = &components.parameters["Limit"];
            assert_eq!(limit.location, ParameterLocation::Query);
            assert!(limit.schema.is(SchemaType::Integer));

            let body = &components.request_bodies["NodeBody"];
            assert!(body.required);
            assert_eq!(body.kind, MediaKind::Json);
        });
    }

    #[test]
    fn test_v2_definitions_and_parameters() {
        let root = json!({
            "swagger": "2.0",
            "definitions": {"Pet": {"type": "object"}},
            "parameters": {
                "Page": {"name": "page", "in": "query", "type": "integer"},
                "PetBody": {"name": "pet", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}
            }
        });
        with_compiler(&root, |compiler| {
            let mut state = CompileState::new();
            let components = compile_components(compiler, &mut state).unwrap();
            assert!(components.schemas["Pet"].is(SchemaType::Object));
            assert_eq!(components.parameters.len(), 1);
            assert!(components.parameters["Page"].pagination);
            assert!(components.request_bodies.is_empty());
        });
    }
}

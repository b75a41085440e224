#![deny(missing_docs)]

//! # Responses
//!
//! Compiles the `responses` map of an operation.

use crate::error::{AppResult, DiagnosticKind};
use crate::ir::{IrResponse, IrSchema, SchemaType};
use crate::oas::dialects::describe_schema;
use crate::oas::media::Lookup;
use crate::oas::ref_utils::resolve_object;
use crate::oas::routes::builder::OperationCompiler;
use crate::oas::schemas::CompileState;
use indexmap::IndexMap;
use serde_json::{Map, Value};

impl<'a> OperationCompiler<'a> {
    /// Compiles every response of `operation`, keyed by status code.
    ///
    /// A response without supported content gets a `void` schema for `204`
    /// and `unknown` otherwise.
    pub(crate) fn compile_responses(
        &self,
        operation: &Map<String, Value>,
        location: &str,
        state: &mut CompileState,
    ) -> AppResult<IndexMap<String, IrResponse>> {
        let mut compiled = IndexMap::new();
        let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
            return Ok(compiled);
        };
        for (status, node) in responses {
            if status.starts_with("x-") {
                continue;
            }
            let response = resolve_object(self.root, node)?;
            let description = response.get("description");
            let content = self.adapter.response_content(self.root, operation, response);

            let (media_type, schema) = match content {
                Lookup::Found(source) => match source.schema {
                    Some(schema) => {
                        let described = describe_schema(&schema, description);
                        (Some(source.media_type), self.schemas.compile_root(&described, state)?)
                    }
                    None => (Some(source.media_type), fallback(status, description)),
                },
                Lookup::Unsupported(types) => {
                    state.diagnose_at(
                        DiagnosticKind::UnsupportedMediaType,
                        location,
                        format!("response {status} skipped content in {}", types.join(", ")),
                    );
                    (None, fallback(status, description))
                }
                Lookup::Absent => (None, fallback(status, description)),
            };
            compiled.insert(status.clone(), IrResponse { media_type, schema });
        }
        Ok(compiled)
    }
}

fn fallback(status: &str, description: Option<&Value>) -> IrSchema {
    let kind = if status == "204" {
        SchemaType::Void
    } else {
        SchemaType::Unknown
    };
    IrSchema {
        description: description
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        ..IrSchema::of_type(kind)
    }
}

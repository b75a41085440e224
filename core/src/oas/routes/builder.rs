#![deny(missing_docs)]

//! # Operation Builder
//!
//! Logic that turns one path + method + operation node into an [`IrOperation`].

use crate::error::{AppResult, DiagnosticKind};
use crate::ir::{operation_key, HttpMethod, IrBody, IrOperation, IrParameters};
use crate::oas::dialects::DialectAdapter;
use crate::oas::media::Lookup;
use crate::oas::routes::naming::{sanitize_operation_id, synthesize_operation_id};
use crate::oas::routes::pagination::PaginationDetector;
use crate::oas::routes::security::operation_security;
use crate::oas::schemas::{CompileState, SchemaCompiler};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Compiles operations of one document.
pub struct OperationCompiler<'a> {
    pub(crate) root: &'a Value,
    pub(crate) adapter: &'a dyn DialectAdapter,
    pub(crate) schemas: SchemaCompiler<'a>,
    pub(crate) pagination: PaginationDetector<'a>,
    security_schemes: IndexMap<String, Value>,
}

/// Ids handed out so far, mapped to the operation key that claimed them first.
#[derive(Debug, Default)]
pub struct OperationIds {
    claimed: HashMap<String, String>,
}

impl OperationIds {
    /// Records `id` for `key`, returning the earlier owner on a collision.
    fn claim(&mut self, id: &str, key: &str) -> Option<String> {
        match self.claimed.get(id) {
            Some(owner) => Some(owner.clone()),
            None => {
                self.claimed.insert(id.to_string(), key.to_string());
                None
            }
        }
    }
}

impl<'a> OperationCompiler<'a> {
    /// Creates an operation compiler.
    ///
    /// # Arguments
    ///
    /// * `root` - The transformed document.
    /// * `adapter` - Dialect knowledge.
    /// * `pagination` - Compiled keyword matcher; `None` disables pagination inference.
    /// * `max_depth` - Schema recursion ceiling.
    pub fn new(root: &'a Value, adapter: &'a dyn DialectAdapter, pagination: Option<&'a Regex>, max_depth: usize) -> Self {
        Self {
            root,
            adapter,
            schemas: SchemaCompiler::new(root, adapter, max_depth),
            pagination: PaginationDetector::new(root, adapter, pagination),
            security_schemes: adapter.security_schemes(root),
        }
    }

    /// The schema compiler bound to the same document.
    pub fn schemas(&self) -> &SchemaCompiler<'a> {
        &self.schemas
    }

    /// Compiles one operation.
    ///
    /// # Arguments
    ///
    /// * `path` - Path template (or webhook name).
    /// * `method` - HTTP method.
    /// * `operation` - The operation object.
    /// * `path_parameters` - The path item's own `parameters`, if any.
    /// * `ids` - Ids claimed by earlier operations.
    pub fn compile_operation(
        &self,
        path: &str,
        method: HttpMethod,
        operation: &Map<String, Value>,
        path_parameters: Option<&Value>,
        ids: &mut OperationIds,
        state: &mut CompileState,
    ) -> AppResult<IrOperation> {
        let key = operation_key(method, path);
        tracing::debug!(operation = %key, "compiling operation");

        let native_id = operation.get("operationId").and_then(Value::as_str);
        let id = native_id
            .and_then(sanitize_operation_id)
            .unwrap_or_else(|| synthesize_operation_id(method, path));
        if let Some(owner) = ids.claim(&id, &key) {
            state.diagnose_at(
                DiagnosticKind::DuplicateOperationId,
                &key,
                format!("operation id `{id}` is already used by {owner}"),
            );
        }

        let merged = self.merged_parameters(path_parameters, operation.get("parameters"))?;
        let mut parameters = IrParameters::default();
        for param in &merged {
            if let Some(compiled) = self.compile_parameter(param, state)? {
                parameters.insert(compiled);
            }
        }

        let body = self.compile_body(operation, &merged, &key, state)?;
        let responses = self.compile_responses(operation, &key, state)?;
        let security = operation_security(self.root, operation, &self.security_schemes, &key, state);

        Ok(IrOperation {
            id,
            operation_id: native_id.map(str::to_string),
            method,
            path: path.to_string(),
            summary: non_empty(operation, "summary"),
            description: non_empty(operation, "description"),
            deprecated: operation.get("deprecated").and_then(Value::as_bool),
            tags: operation
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            parameters,
            body,
            responses,
            security,
            extensions: operation
                .iter()
                .filter(|(k, _)| k.starts_with("x-"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Compiles the request body of an operation.
    pub(crate) fn compile_body(
        &self,
        operation: &Map<String, Value>,
        parameters: &[Map<String, Value>],
        location: &str,
        state: &mut CompileState,
    ) -> AppResult<Option<IrBody>> {
        match self.adapter.request_body(self.root, operation, parameters)? {
            Lookup::Found(source) => {
                let schema = self.schemas.compile_root(&source.schema, state)?;
                Ok(Some(IrBody {
                    media_type: source.media_type,
                    kind: source.kind,
                    schema,
                    required: source.required,
                    pagination: self.pagination.detect("", &source.schema),
                }))
            }
            Lookup::Unsupported(types) => {
                state.diagnose_at(
                    DiagnosticKind::UnsupportedMediaType,
                    location,
                    format!("request body skipped; unsupported media types: {}", types.join(", ")),
                );
                Ok(None)
            }
            Lookup::Absent => Ok(None),
        }
    }
}

fn non_empty(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

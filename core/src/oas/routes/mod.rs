#![deny(missing_docs)]

//! # Routes Module
//!
//! Entry point for compiling OpenAPI `paths` and `webhooks`.
//! Orchestrates Path Items -> Operation Builder -> IR Operations.

pub mod builder;
pub mod naming;
pub mod pagination;
pub mod params;
pub mod responses;
pub mod security;

use crate::error::{AppError, AppResult};
use crate::ir::{HttpMethod, IrPathItem};
use crate::oas::ref_utils::resolve_object;
use crate::oas::routes::builder::{OperationCompiler, OperationIds};
use crate::oas::schemas::CompileState;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Compiled `paths` and `webhooks`.
#[derive(Debug, Default)]
pub struct CompiledRoutes {
    /// Operations keyed by path template.
    pub paths: IndexMap<String, IrPathItem>,
    /// Operations keyed by webhook name.
    pub webhooks: IndexMap<String, IrPathItem>,
}

/// Compiles every path item and webhook of the document bound to `compiler`.
///
/// Operation ids are shared between paths and webhooks, so a webhook reusing a
/// path operation's id is reported like any other duplicate.
pub fn compile_routes(compiler: &OperationCompiler<'_>, state: &mut CompileState) -> AppResult<CompiledRoutes> {
    let mut ids = OperationIds::default();
    let mut routes = CompiledRoutes::default();

    // 1. Standard paths
    match compiler.root.get("paths") {
        None => {}
        Some(Value::Object(paths)) => {
            for (path, item) in paths {
                let compiled = compile_path_item(compiler, path, item, &mut ids, state)?;
                routes.paths.insert(path.clone(), compiled);
            }
        }
        Some(_) => return Err(AppError::InvalidDocument("`paths` must be a map".into())),
    }

    // 2. Webhooks
    if let Some(webhooks) = compiler.adapter.webhooks(compiler.root) {
        for (name, item) in webhooks {
            let compiled = compile_path_item(compiler, name, item, &mut ids, state)?;
            routes.webhooks.insert(name.clone(), compiled);
        }
    }

    tracing::debug!(
        paths = routes.paths.len(),
        webhooks = routes.webhooks.len(),
        "routes compiled"
    );
    Ok(routes)
}

/// Compiles the operations of one path item, in method visiting order.
fn compile_path_item(
    compiler: &OperationCompiler<'_>,
    path: &str,
    item: &Value,
    ids: &mut OperationIds,
    state: &mut CompileState,
) -> AppResult<IrPathItem> {
    let item = merged_path_item(compiler.root, item)?;
    let mut compiled = IrPathItem::new();
    for method in HttpMethod::ALL {
        let Some(operation) = item.get(method.as_str()).and_then(Value::as_object) else {
            continue;
        };
        let op = compiler.compile_operation(path, method, operation, item.get("parameters"), ids, state)?;
        compiled.insert(method, op);
    }
    Ok(compiled)
}

/// A path item with its `$ref` target merged underneath the local keys.
fn merged_path_item(root: &Value, item: &Value) -> AppResult<Map<String, Value>> {
    let Some(local) = item.as_object() else {
        return Err(AppError::InvalidDocument(format!("path item must be a map, got {item}")));
    };
    if !local.contains_key("$ref") {
        return Ok(local.clone());
    }
    let mut merged = resolve_object(root, item)?.clone();
    for (key, value) in local {
        if key != "$ref" {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(merged)
}

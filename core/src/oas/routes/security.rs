#![deny(missing_docs)]

//! # Security
//!
//! Resolves an operation's security requirements against the declared schemes.

use crate::error::DiagnosticKind;
use crate::oas::schemas::CompileState;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Schemes that apply to `operation`.
///
/// Operation-level `security` replaces the document-level list, including
/// when it is empty. Each scheme is listed once, in first-use order.
pub fn operation_security(
    root: &Value,
    operation: &Map<String, Value>,
    schemes: &IndexMap<String, Value>,
    location: &str,
    state: &mut CompileState,
) -> Vec<Value> {
    let requirements = operation
        .get("security")
        .or_else(|| root.get("security"))
        .and_then(Value::as_array);
    let mut used: IndexMap<&str, &Value> = IndexMap::new();
    for requirement in requirements.into_iter().flatten() {
        let Some(requirement) = requirement.as_object() else {
            continue;
        };
        for name in requirement.keys() {
            match schemes.get_key_value(name) {
                Some((key, scheme)) => {
                    used.entry(key.as_str()).or_insert(scheme);
                }
                None => state.diagnose_at(
                    DiagnosticKind::UnresolvedSecurityScheme,
                    location,
                    format!("security scheme `{name}` is not declared"),
                ),
            }
        }
    }
    used.into_values().cloned().collect()
}

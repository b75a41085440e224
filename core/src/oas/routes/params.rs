#![deny(missing_docs)]

//! # Parameters
//!
//! Merging of path-item and operation parameters, and compilation of a single
//! parameter into an [`IrParameter`].

use crate::error::{AppError, AppResult};
use crate::ir::{IrParameter, ParameterLocation};
use crate::oas::dialects::describe_schema;
use crate::oas::ref_utils::resolve_object;
use crate::oas::routes::builder::OperationCompiler;
use crate::oas::schemas::CompileState;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

impl<'a> OperationCompiler<'a> {
    /// Resolves and merges parameter lists.
    ///
    /// Path-item parameters seed the list; an operation parameter with the
    /// same `in` and `name` replaces the seeded entry in place.
    pub(crate) fn merged_parameters(
        &self,
        path_level: Option<&Value>,
        operation_level: Option<&Value>,
    ) -> AppResult<Vec<Map<String, Value>>> {
        let mut merged: IndexMap<(String, String), Map<String, Value>> = IndexMap::new();
        for list in [path_level, operation_level].into_iter().flatten() {
            for node in list.as_array().into_iter().flatten() {
                let param = resolve_object(self.root, node)?;
                let key = (
                    param.get("in").and_then(Value::as_str).unwrap_or_default().to_string(),
                    param.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                );
                merged.insert(key, param.clone());
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Compiles one resolved parameter.
    ///
    /// Returns `None` for body-like locations (`body`, `formData`), which are
    /// compiled as the request body instead.
    ///
    /// # Errors
    ///
    /// `InvalidDocument` when the parameter has no name.
    pub fn compile_parameter(&self, param: &Map<String, Value>, state: &mut CompileState) -> AppResult<Option<IrParameter>> {
        let Some(location) = param
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::from_keyword)
        else {
            return Ok(None);
        };
        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidDocument(format!("{location:?} parameter without a name")))?;

        let value_schema = self.adapter.parameter_schema(param).unwrap_or_else(|| json!({}));
        let described = describe_schema(&value_schema, param.get("description"));
        let schema = self.schemas.compile_root(&described, state)?;
        let (style, explode) = self.adapter.parameter_style(param, location);

        let pagination = self.pagination.is_parameter(name, &value_schema);

        Ok(Some(IrParameter {
            name: name.to_string(),
            location,
            schema,
            style,
            explode,
            allow_reserved: match location {
                ParameterLocation::Query => Some(param.get("allowReserved").and_then(Value::as_bool).unwrap_or(false)),
                _ => None,
            },
            required: location == ParameterLocation::Path
                || param.get("required").and_then(Value::as_bool).unwrap_or(false),
            pagination,
            deprecated: param.get("deprecated").and_then(Value::as_bool),
            description: param
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            extensions: param
                .iter()
                .filter(|(k, _)| k.starts_with("x-"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }))
    }
}

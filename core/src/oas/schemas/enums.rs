#![deny(missing_docs)]

//! # Enums
//!
//! Compiles `enum` literal lists into an `enum` node whose `items` are `const`
//! children, one per supported literal.

use crate::error::{AppResult, DiagnosticKind};
use crate::ir::{IrSchema, LogicalOperator, SchemaType};
use crate::oas::schemas::{CompileState, SchemaCompiler};
use serde_json::{Map, Value};

impl<'a> SchemaCompiler<'a> {
    pub(crate) fn compile_enum(&self, map: &Map<String, Value>, values: &[Value], state: &mut CompileState) -> AppResult<IrSchema> {
        let mut ir = self.init(map);
        self.apply_meta(map, &mut ir);
        ir.kind = Some(SchemaType::Enum);

        let types = self.adapter.schema_types(map);
        let has_type = |t: &str| types.iter().any(|ty| ty == t);
        let names = map
            .get("x-enum-varnames")
            .or_else(|| map.get("x-enumNames"))
            .and_then(Value::as_array);
        let descriptions = map.get("x-enum-descriptions").and_then(Value::as_array);

        let mut items = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let kind = match value {
                Value::String(_) => SchemaType::String,
                Value::Bool(_) => SchemaType::Boolean,
                Value::Number(n) => {
                    let integral = n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
                    if has_type("integer") && integral {
                        SchemaType::Integer
                    } else {
                        SchemaType::Number
                    }
                }
                Value::Array(_) => SchemaType::Tuple,
                Value::Null if has_type("null") => SchemaType::Null,
                Value::Null => continue,
                Value::Object(_) => {
                    state.diagnose(
                        DiagnosticKind::UnsupportedEnumValue,
                        format!("enum value {value} skipped; object literals are not supported"),
                    );
                    continue;
                }
            };
            let mut item = IrSchema::of_type(kind);
            item.const_value = Some(value.clone());
            item.title = names
                .and_then(|n| n.get(index))
                .and_then(Value::as_str)
                .map(str::to_string);
            item.description = descriptions
                .and_then(|d| d.get(index))
                .and_then(Value::as_str)
                .map(str::to_string);
            items.push(item);
        }

        if !items.is_empty() {
            ir.items = items;
            ir.logical_operator = Some(LogicalOperator::Or);
        }
        Ok(ir)
    }
}

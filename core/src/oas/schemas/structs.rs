#![deny(missing_docs)]

//! # Structural Schemas
//!
//! Objects, arrays and tuples.

use crate::error::AppResult;
use crate::ir::{IrSchema, LogicalOperator, SchemaType};
use crate::oas::schemas::{CompileState, SchemaCompiler};
use serde_json::{Map, Value};

impl<'a> SchemaCompiler<'a> {
    /// Compiles an array schema on top of `ir`.
    ///
    /// Becomes a tuple when `prefixItems` is non-empty, when `minItems` equals a
    /// non-zero `maxItems`, or when a `const` is present.
    pub(crate) fn compile_array(&self, map: &Map<String, Value>, mut ir: IrSchema, state: &mut CompileState) -> AppResult<IrSchema> {
        let prefix_items = map
            .get("prefixItems")
            .and_then(Value::as_array)
            .filter(|p| !p.is_empty());
        let fixed_len = match (ir.max_items, ir.min_items) {
            (Some(max), Some(min)) if max > 0 && max == min => Some(max),
            _ => None,
        };
        let is_tuple = prefix_items.is_some() || fixed_len.is_some() || map.contains_key("const");
        ir.kind = Some(if is_tuple { SchemaType::Tuple } else { SchemaType::Array });

        let mut items = Vec::new();
        for prefix in prefix_items.into_iter().flatten() {
            items.push(self.compile(prefix, state)?);
        }

        if let Some(element) = map.get("items") {
            let compiled = self.compile(element, state)?;
            match fixed_len {
                Some(len) if items.is_empty() => {
                    items = std::iter::repeat(compiled).take(len as usize).collect();
                }
                _ if self.is_hoistable_composition(element) => {
                    // the element's union becomes the array's own item list
                    ir.merge_scopes(&compiled.access_scopes);
                    let kind = ir.kind;
                    ir = ir.overlay(compiled);
                    ir.kind = kind;
                }
                _ => items.push(compiled),
            }
        }

        for item in &items {
            ir.merge_scopes(&item.access_scopes);
        }
        Ok(ir.add_items(items, LogicalOperator::Or, false))
    }

    /// A non-nullable, non-`$ref` element with a multi-branch composition.
    fn is_hoistable_composition(&self, element: &Value) -> bool {
        let Some(map) = element.as_object() else {
            return false;
        };
        if map.contains_key("$ref") {
            return false;
        }
        let branches = map
            .get("allOf")
            .or_else(|| map.get("anyOf"))
            .or_else(|| map.get("oneOf"))
            .and_then(Value::as_array);
        match branches {
            Some(branches) if branches.len() > 1 => {
                !self.adapter.schema_types(map).iter().any(|t| t == "null")
            }
            _ => false,
        }
    }

    /// Compiles an object schema on top of `ir`.
    pub(crate) fn compile_object(&self, map: &Map<String, Value>, mut ir: IrSchema, state: &mut CompileState) -> AppResult<IrSchema> {
        ir.kind = Some(SchemaType::Object);

        if let Some(properties) = map.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                if property.is_boolean() {
                    continue;
                }
                state.is_property = true;
                let compiled = self.compile(property, state)?;
                ir.merge_scopes(&compiled.access_scopes);
                ir.properties.insert(name.clone(), compiled);
            }
        }

        match map.get("additionalProperties") {
            None => {
                if ir.properties.is_empty() {
                    ir.additional_properties = Some(Box::new(IrSchema::of_type(SchemaType::Unknown)));
                }
            }
            Some(Value::Bool(true)) => {
                ir.additional_properties = Some(Box::new(IrSchema::of_type(SchemaType::Unknown)));
            }
            Some(Value::Bool(false)) => {
                // an empty allOf branch must not close the merged object
                if !(state.in_all_of && ir.properties.is_empty()) {
                    ir.additional_properties = Some(Box::new(IrSchema::of_type(SchemaType::Never)));
                }
            }
            Some(schema) => {
                let compiled = self.compile(schema, state)?;
                ir.merge_scopes(&compiled.access_scopes);
                ir.additional_properties = Some(Box::new(compiled));
            }
        }

        if let Some(patterns) = map.get("patternProperties").and_then(Value::as_object) {
            for (pattern, schema) in patterns {
                let compiled = self.compile(schema, state)?;
                ir.merge_scopes(&compiled.access_scopes);
                ir.pattern_properties.insert(pattern.clone(), compiled);
            }
        }

        if let Some(names) = map.get("propertyNames") {
            ir.property_names = Some(Box::new(self.compile(names, state)?));
        }

        ir.required = string_list(map.get("required"));
        Ok(ir)
    }
}

/// Reads an array of strings, ignoring anything else.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

#![deny(missing_docs)]

//! # Compositions
//!
//! `allOf`, `anyOf` and `oneOf`, plus discriminator handling.
//!
//! A discriminator on a parent schema is pushed down into its children: a child
//! that extends the parent through `allOf` gets the discriminator property
//! pinned to its own value(s), and each `$ref` branch of a discriminated union
//! is intersected with an object that pins the property.

use crate::error::AppResult;
use crate::ir::{IrSchema, LogicalOperator, SchemaType};
use crate::oas::ref_utils::{ref_of, ref_to_name, resolve};
use crate::oas::schemas::structs::string_list;
use crate::oas::schemas::{CompileState, SchemaCompiler};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A discriminator declaration, normalised across dialects.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Discriminator<'s> {
    /// Name of the tag property.
    pub(crate) property_name: String,
    /// `(value, target)` pairs, in declaration order.
    pub(crate) mapping: Vec<(String, String)>,
    /// `oneOf` branches of the schema declaring the discriminator.
    pub(crate) one_of: Option<&'s [Value]>,
}

impl<'s> Discriminator<'s> {
    /// Reads the `discriminator` keyword; V2 declares it as a bare property name.
    pub(crate) fn from_schema(schema: &'s Map<String, Value>) -> Option<Self> {
        let (property_name, mapping) = match schema.get("discriminator")? {
            Value::String(name) => (name.clone(), Vec::new()),
            Value::Object(d) => {
                let name = d.get("propertyName")?.as_str()?.to_string();
                let mapping = d
                    .get("mapping")
                    .and_then(Value::as_object)
                    .map(|m| {
                        m.iter()
                            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                            .collect()
                    })
                    .unwrap_or_default();
                (name, mapping)
            }
            _ => return None,
        };
        Some(Self {
            property_name,
            mapping,
            one_of: schema.get("oneOf").and_then(Value::as_array).map(Vec::as_slice),
        })
    }
}

/// Values that select `pointer` under a discriminator mapping.
///
/// Mapping targets may be full pointers or bare schema names. With no mapping
/// entry the schema name itself is the value, unless `allow_implicit` says no.
pub(crate) fn discriminator_values(pointer: &str, mapping: &[(String, String)], allow_implicit: bool) -> Vec<String> {
    let name = ref_to_name(pointer);
    let values: Vec<String> = mapping
        .iter()
        .filter(|(_, target)| target == pointer || *target == name)
        .map(|(value, _)| value.clone())
        .collect();
    if values.is_empty() && allow_implicit {
        return vec![name];
    }
    values
}

/// Turns a discriminator value into a `const` node of the property's type.
///
/// A value that does not parse as the declared type stays a string.
pub(crate) fn convert_discriminator_value(value: &str, property_type: SchemaType) -> IrSchema {
    let typed = match property_type {
        SchemaType::Boolean => value.parse::<bool>().ok().map(Value::Bool),
        SchemaType::Integer => value.parse::<i64>().ok().map(Value::from),
        SchemaType::Number => value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    };
    let (const_value, kind) = match typed {
        Some(v) => (v, property_type),
        None => (Value::String(value.to_string()), SchemaType::String),
    };
    let mut ir = IrSchema::of_type(kind);
    ir.const_value = Some(const_value);
    ir
}

fn values_schema(values: &[String], property_type: SchemaType) -> IrSchema {
    let mut schemas: Vec<IrSchema> = values
        .iter()
        .map(|v| convert_discriminator_value(v, property_type))
        .collect();
    if schemas.len() == 1 {
        return schemas.remove(0);
    }
    IrSchema::composition(schemas, LogicalOperator::Or)
}

impl<'a> SchemaCompiler<'a> {
    /// Follows a `$ref` if present, without compiling anything.
    fn resolved<'n>(&self, node: &'n Value) -> AppResult<&'n Value>
    where
        'a: 'n,
    {
        match ref_of(node) {
            Some(pointer) => resolve(self.root, pointer),
            None => Ok(node),
        }
    }

    /// Type of the discriminator property among `schemas`, searched through
    /// `properties` and nested `allOf` chains. Defaults to string.
    pub(crate) fn find_discriminator_property_type(&self, property_name: &str, schemas: &[Value]) -> SchemaType {
        let mut visited = HashSet::new();
        self.property_type_in(property_name, schemas, &mut visited)
            .unwrap_or(SchemaType::String)
    }

    fn property_type_in(&self, property_name: &str, schemas: &[Value], visited: &mut HashSet<String>) -> Option<SchemaType> {
        for schema in schemas {
            if let Some(pointer) = ref_of(schema) {
                if !visited.insert(pointer.to_string()) {
                    continue;
                }
            }
            let Ok(resolved) = self.resolved(schema) else {
                continue;
            };
            if let Some(property) = resolved.get("properties").and_then(|p| p.get(property_name)) {
                if let Ok(property) = self.resolved(property) {
                    let declared = property.get("type").and_then(Value::as_str);
                    if let Some(kind @ (SchemaType::Boolean | SchemaType::Integer | SchemaType::Number)) =
                        declared.and_then(SchemaType::from_keyword)
                    {
                        return Some(kind);
                    }
                }
            }
            if let Some(all_of) = resolved.get("allOf").and_then(Value::as_array) {
                if let Some(kind) = self.property_type_in(property_name, all_of, visited) {
                    return Some(kind);
                }
            }
        }
        None
    }

    /// Discriminators declared on `schema` or anywhere up its `allOf` chain.
    fn find_discriminators(&self, schema: &'a Value, found: &mut Vec<Discriminator<'a>>, visited: &mut HashSet<String>) {
        let Some(map) = schema.as_object() else {
            return;
        };
        if let Some(discriminator) = Discriminator::from_schema(map) {
            found.push(discriminator);
        }
        for branch in map.get("allOf").and_then(Value::as_array).into_iter().flatten() {
            let next = match ref_of(branch) {
                Some(pointer) => {
                    if !visited.insert(pointer.to_string()) {
                        continue;
                    }
                    match resolve(self.root, pointer) {
                        Ok(target) => target,
                        Err(_) => continue,
                    }
                }
                None => branch,
            };
            self.find_discriminators(next, found, visited);
        }
    }

    /// Whether the parent requires `property`, directly or through an `allOf` member.
    fn parent_requires(&self, parent: &Value, property: &str) -> bool {
        let requires = |node: &Value| string_list(node.get("required")).iter().any(|r| r == property);
        if requires(parent) {
            return true;
        }
        parent
            .get("allOf")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| self.resolved(item).ok())
            .any(requires)
    }

    pub(crate) fn compile_all_of(&self, map: &Map<String, Value>, branches: &[Value], state: &mut CompileState) -> AppResult<IrSchema> {
        let mut ir = self.init(map);
        self.apply_meta(map, &mut ir);
        let types = self.adapter.schema_types(map);
        let parent_required = string_list(map.get("required"));

        let mut items: Vec<IrSchema> = Vec::with_capacity(branches.len());
        let mut pinned: Vec<(Discriminator<'a>, Vec<String>, bool)> = Vec::new();
        let mut pinned_names: HashSet<String> = HashSet::new();

        for branch in branches {
            let branch_ref = ref_of(branch);
            let saved = state.in_all_of;
            if branch_ref.is_none() {
                state.in_all_of = true;
            }
            let result = self.compile(branch, state);
            state.in_all_of = saved;
            let mut compiled = result?;

            if !parent_required.is_empty() {
                compiled.required.extend(parent_required.iter().cloned());
            }
            ir.merge_scopes(&compiled.access_scopes);
            items.push(compiled);

            let (Some(pointer), Some(current)) = (branch_ref, state.current_ref.clone()) else {
                continue;
            };
            let parent = resolve(self.root, pointer)?;
            let mut found = Vec::new();
            self.find_discriminators(parent, &mut found, &mut HashSet::from([pointer.to_string()]));
            for discriminator in found {
                if pinned_names.contains(&discriminator.property_name) {
                    continue;
                }
                // a parent with oneOf only names children that are listed in it
                let allow_implicit = match discriminator.one_of {
                    Some(one_of) => one_of.iter().any(|o| ref_of(o) == Some(current.as_str())),
                    None => true,
                };
                let values = discriminator_values(&current, &discriminator.mapping, allow_implicit);
                if values.is_empty() {
                    continue;
                }
                let required = self.parent_requires(parent, &discriminator.property_name);
                pinned_names.insert(discriminator.property_name.clone());
                pinned.push((discriminator, values, required));
            }
        }

        for (discriminator, values, required) in pinned {
            let property_type = self.find_discriminator_property_type(&discriminator.property_name, branches);
            let property = values_schema(&values, property_type);
            let name = discriminator.property_name;
            let target = items
                .iter_mut()
                .rev()
                .find(|item| item.is(SchemaType::Object) || !item.properties.is_empty());
            match target {
                Some(inline) => {
                    inline.properties.insert(name.clone(), property);
                    if required && !inline.required.contains(&name) {
                        inline.required.push(name);
                    }
                }
                None => {
                    let mut object = IrSchema::of_type(SchemaType::Object);
                    object.properties.insert(name.clone(), property);
                    if required {
                        object.required.push(name);
                    }
                    items.push(object);
                }
            }
        }

        if types.iter().any(|t| t == "object") {
            let mut view = self.compile_object(map, IrSchema::default(), state)?;
            if !view.properties.is_empty() {
                let missing: Vec<String> = view
                    .required
                    .iter()
                    .filter(|r| !view.properties.contains_key(*r))
                    .cloned()
                    .collect();
                for property in missing {
                    if let Some(found) = self.property_from_branches(&property, branches, state)? {
                        view.properties.insert(property, found);
                    }
                }
                ir.merge_scopes(&view.access_scopes);
                items.push(view);
            }
        }

        let has_items = !items.is_empty();
        let ir = ir.add_items(items, LogicalOperator::And, true);

        if types.iter().any(|t| t == "null") {
            let mut nested = Vec::with_capacity(2);
            let mut outer = IrSchema::default();
            outer.description = ir.description.clone();
            outer.deprecated = ir.deprecated;
            outer.access_scopes = ir.access_scopes.clone();
            if has_items {
                nested.push(ir);
            }
            nested.push(IrSchema::of_type(SchemaType::Null));
            outer.items = nested;
            outer.logical_operator = Some(LogicalOperator::Or);
            return Ok(outer);
        }
        Ok(ir)
    }

    /// Compiles `property` from the first object branch that declares it.
    fn property_from_branches(&self, property: &str, branches: &[Value], state: &mut CompileState) -> AppResult<Option<IrSchema>> {
        for branch in branches {
            let resolved = self.resolved(branch)?;
            let Some(branch_map) = resolved.as_object() else {
                continue;
            };
            if !self.adapter.schema_types(branch_map).iter().any(|t| t == "object") {
                continue;
            }
            let Some(schema) = branch_map.get("properties").and_then(|p| p.get(property)) else {
                continue;
            };
            if schema.is_boolean() {
                continue;
            }
            state.is_property = true;
            return self.compile(schema, state).map(Some);
        }
        Ok(None)
    }

    pub(crate) fn compile_any_of(&self, map: &Map<String, Value>, branches: &[Value], state: &mut CompileState) -> AppResult<IrSchema> {
        self.compile_union(map, branches, false, state)
    }

    pub(crate) fn compile_one_of(&self, map: &Map<String, Value>, branches: &[Value], state: &mut CompileState) -> AppResult<IrSchema> {
        self.compile_union(map, branches, true, state)
    }

    /// Shared body of `anyOf` / `oneOf`. Only `oneOf` requires the pinned
    /// discriminator property and flattens nested untyped unions.
    fn compile_union(&self, map: &Map<String, Value>, branches: &[Value], exclusive: bool, state: &mut CompileState) -> AppResult<IrSchema> {
        let mut ir = self.init(map);
        self.apply_meta(map, &mut ir);
        let types = self.adapter.schema_types(map);
        let discriminator = Discriminator::from_schema(map);
        let property_type = discriminator
            .as_ref()
            .map(|d| self.find_discriminator_property_type(&d.property_name, branches));

        let mut items: Vec<IrSchema> = Vec::with_capacity(branches.len());
        for branch in branches {
            let mut compiled = self.compile(branch, state)?;
            ir.merge_scopes(&compiled.access_scopes);

            if let (Some(d), Some(property_type), Some(pointer)) =
                (&discriminator, property_type, compiled.reference.clone())
            {
                let values = discriminator_values(&pointer, &d.mapping, true);
                let mut pin = IrSchema::of_type(SchemaType::Object);
                pin.properties
                    .insert(d.property_name.clone(), values_schema(&values, property_type));
                if exclusive {
                    pin.required.push(d.property_name.clone());
                }
                compiled = IrSchema::composition(vec![pin, compiled], LogicalOperator::And);
            }

            let flatten = exclusive
                && compiled.kind.is_none()
                && compiled.reference.is_none()
                && compiled.logical_operator == Some(LogicalOperator::Or)
                && !compiled.items.is_empty();
            if flatten {
                items.extend(compiled.items);
            } else {
                items.push(compiled);
            }
        }

        if types.iter().any(|t| t == "null") {
            items.push(IrSchema::of_type(SchemaType::Null));
        }
        let ir = ir.add_items(items, LogicalOperator::Or, true);

        if types.iter().any(|t| t == "object") {
            let view = self.compile_object(map, IrSchema::default(), state)?;
            if !view.properties.is_empty() {
                let mut scopes = ir.access_scopes.clone();
                scopes.extend(view.access_scopes.iter().copied());
                let mut outer = IrSchema::composition(vec![ir, view], LogicalOperator::And);
                outer.access_scopes = scopes;
                return Ok(outer);
            }
        }
        Ok(ir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::document::Dialect;
    use crate::oas::schemas::test_support::{compile_component_in, compile_in};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_single_branch_all_of_collapses() {
        let root = json!({"components": {"schemas": {"Pet": {"type": "object"}}}});
        let (ir, _) = compile_in(
            &root,
            Dialect::V3_1,
            &json!({"allOf": [{"$ref": "#/components/schemas/Pet"}], "description": "Wrapped"}),
        );
        assert_eq!(ir.reference.as_deref(), Some("#/components/schemas/Pet"));
        assert_eq!(ir.description.as_deref(), Some("Wrapped"));
        assert!(ir.items.is_empty());
        assert!(ir.logical_operator.is_none());
    }

    #[test]
    fn test_parent_required_pushed_into_branches() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_1,
            &json!({
                "allOf": [
                    {"type": "object", "properties": {"a": {"type": "string"}}},
                    {"type": "object", "properties": {"b": {"type": "string"}}}
                ],
                "required": ["a"]
            }),
        );
        assert_eq!(ir.items[0].required, vec!["a"]);
        assert_eq!(ir.items[1].required, vec!["a"]);
    }

    #[test]
    fn test_nullable_all_of_nests_union() {
        let root = json!({"components": {"schemas": {"Pet": {"type": "object"}}}});
        let (ir, _) = compile_in(
            &root,
            Dialect::V3_0,
            &json!({"allOf": [{"$ref": "#/components/schemas/Pet"}], "nullable": true}),
        );
        assert_eq!(ir.logical_operator, Some(LogicalOperator::Or));
        assert_eq!(ir.items[0].reference.as_deref(), Some("#/components/schemas/Pet"));
        assert!(ir.items[1].is(SchemaType::Null));
    }

    #[test]
    fn test_all_of_object_view_copies_missing_required() {
        let root = json!({"components": {"schemas": {
            "Base": {"type": "object", "properties": {"id": {"type": "integer"}}}
        }}});
        let (ir, _) = compile_in(
            &root,
            Dialect::V3_1,
            &json!({
                "type": "object",
                "allOf": [{"$ref": "#/components/schemas/Base"}],
                "properties": {"name": {"type": "string"}},
                "required": ["id", "name"]
            }),
        );
        assert_eq!(ir.logical_operator, Some(LogicalOperator::And));
        let view = &ir.items[1];
        assert!(view.properties.contains_key("name"));
        assert!(view.properties["id"].is(SchemaType::Integer));
    }

    #[test]
    fn test_child_pins_parent_discriminator() {
        let root = json!({"components": {"schemas": {
            "Pet": {
                "type": "object",
                "required": ["petType"],
                "properties": {"petType": {"type": "string"}},
                "discriminator": {"propertyName": "petType", "mapping": {"dog": "#/components/schemas/Dog"}}
            },
            "Dog": {
                "allOf": [
                    {"$ref": "#/components/schemas/Pet"},
                    {"type": "object", "properties": {"bark": {"type": "boolean"}}}
                ]
            }
        }}});
        let dog = compile_component_in(&root, Dialect::V3_1, "Dog");
        let inline = &dog.items[1];
        assert_eq!(inline.properties["petType"].const_value, Some(json!("dog")));
        assert_eq!(inline.required, vec!["petType"]);
    }

    #[test]
    fn test_one_of_discriminator_intersects_branches() {
        let root = json!({"components": {"schemas": {
            "Cat": {"type": "object", "properties": {"kind": {"type": "integer"}}},
            "Dog": {"type": "object", "properties": {"kind": {"type": "integer"}}}
        }}});
        let (ir, _) = compile_in(
            &root,
            Dialect::V3_1,
            &json!({
                "oneOf": [{"$ref": "#/components/schemas/Cat"}, {"$ref": "#/components/schemas/Dog"}],
                "discriminator": {"propertyName": "kind", "mapping": {"1": "#/components/schemas/Cat", "2": "Dog"}}
            }),
        );
        assert_eq!(ir.logical_operator, Some(LogicalOperator::Or));
        let cat = &ir.items[0];
        assert_eq!(cat.logical_operator, Some(LogicalOperator::And));
        assert_eq!(cat.items[0].properties["kind"].const_value, Some(json!(1)));
        assert!(cat.items[0].properties["kind"].is(SchemaType::Integer));
        assert_eq!(cat.items[0].required, vec!["kind"]);
        assert_eq!(ir.items[1].items[0].properties["kind"].const_value, Some(json!(2)));
    }

    #[test]
    fn test_any_of_does_not_require_discriminator() {
        let root = json!({"components": {"schemas": {"Cat": {"type": "object"}}}});
        let (ir, _) = compile_in(
            &root,
            Dialect::V3_1,
            &json!({
                "anyOf": [{"$ref": "#/components/schemas/Cat"}, {"type": "string"}],
                "discriminator": {"propertyName": "kind"}
            }),
        );
        let cat = &ir.items[0];
        assert_eq!(cat.items[0].properties["kind"].const_value, Some(json!("Cat")));
        assert!(cat.items[0].required.is_empty());
    }

    #[test]
    fn test_one_of_flattens_nested_union_but_not_enum() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_1,
            &json!({"oneOf": [
                {"oneOf": [{"type": "string"}, {"type": "integer"}]},
                {"enum": ["a", "b"]}
            ]}),
        );
        assert_eq!(ir.items.len(), 3);
        assert!(ir.items[2].is(SchemaType::Enum));
    }

    #[test]
    fn test_nullable_one_of() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_0,
            &json!({"oneOf": [{"type": "string"}, {"type": "integer"}], "nullable": true}),
        );
        assert_eq!(ir.items.len(), 3);
        assert!(ir.items[2].is(SchemaType::Null));
    }

    #[test]
    fn test_convert_discriminator_value_fallback() {
        assert_eq!(
            convert_discriminator_value("yes", SchemaType::Boolean).const_value,
            Some(json!("yes"))
        );
        assert_eq!(
            convert_discriminator_value("true", SchemaType::Boolean).const_value,
            Some(json!(true))
        );
        assert_eq!(
            convert_discriminator_value("1.5", SchemaType::Number).const_value,
            Some(json!(1.5))
        );
    }

    #[test]
    fn test_discriminator_values() {
        let mapping = vec![("dog".to_string(), "#/components/schemas/Dog".to_string())];
        assert_eq!(discriminator_values("#/components/schemas/Dog", &mapping, true), vec!["dog"]);
        assert_eq!(discriminator_values("#/components/schemas/Cat", &mapping, true), vec!["Cat"]);
        assert!(discriminator_values("#/components/schemas/Cat", &mapping, false).is_empty());
    }
}

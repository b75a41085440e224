#![deny(missing_docs)]

//! # Schema Compilation
//!
//! Turns a dialect schema node into an [`IrSchema`].
//!
//! Dispatch is a `match` over [`SchemaKind`], first match wins:
//! `$ref` → `enum` → `allOf` → `anyOf` → `oneOf` → `type`/`properties` → unknown.
//!
//! - **refs**: component references, inlining of deep pointers, cycle cut-off.
//! - **enums**: literal lists into `const` children.
//! - **compositions**: `allOf` / `anyOf` / `oneOf` and discriminators.
//! - **structs**: objects, arrays and tuples.

pub mod compositions;
pub mod enums;
pub mod refs;
pub mod structs;

use crate::error::{AppError, AppResult, Diagnostic, DiagnosticKind};
use crate::ir::{IrSchema, LogicalOperator, SchemaType, Scope};
use crate::oas::dialects::DialectAdapter;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The shape of a schema node, decided once per node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind<'s> {
    /// `$ref` to another node.
    Ref(&'s str),
    /// `enum` literal list.
    Enum(&'s [Value]),
    /// Intersection branches.
    AllOf(&'s [Value]),
    /// Union branches.
    AnyOf(&'s [Value]),
    /// Exclusive union branches.
    OneOf(&'s [Value]),
    /// One or more concrete types (`null` included when nullable).
    Type(Vec<String>),
    /// Nothing recognisable.
    Unknown,
}

impl<'s> SchemaKind<'s> {
    /// Classifies a schema map.
    pub fn classify(schema: &'s Map<String, Value>, adapter: &dyn DialectAdapter) -> Self {
        if let Some(pointer) = schema.get("$ref").and_then(Value::as_str) {
            return SchemaKind::Ref(pointer);
        }
        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            return SchemaKind::Enum(values);
        }
        if let Some(branches) = schema.get("allOf").and_then(Value::as_array) {
            return SchemaKind::AllOf(branches);
        }
        if let Some(branches) = schema.get("anyOf").and_then(Value::as_array) {
            return SchemaKind::AnyOf(branches);
        }
        if let Some(branches) = schema.get("oneOf").and_then(Value::as_array) {
            return SchemaKind::OneOf(branches);
        }
        if schema.contains_key("type") || schema.contains_key("properties") {
            let types = adapter.schema_types(schema);
            if !types.is_empty() {
                return SchemaKind::Type(types);
            }
        }
        SchemaKind::Unknown
    }
}

/// Mutable state threaded through one compilation.
///
/// The per-walk fields are reset by [`CompileState::begin_walk`]; the scope
/// cache and diagnostics live for the whole document.
#[derive(Debug, Default)]
pub struct CompileState {
    /// Pointer of the component currently being expanded.
    pub(crate) current_ref: Option<String>,
    /// Pointers on the active expansion path.
    pub(crate) tracker: HashSet<String>,
    /// Set while compiling a non-`$ref` branch of an `allOf`.
    pub(crate) in_all_of: bool,
    /// Set by the object compiler right before compiling a property.
    pub(crate) is_property: bool,
    depth: usize,
    scope_cache: HashMap<String, BTreeSet<Scope>>,
    diagnostics: Vec<Diagnostic>,
}

impl CompileState {
    /// Fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new top-level walk, optionally seeded with the component being compiled.
    pub fn begin_walk(&mut self, pointer: Option<&str>) {
        self.tracker.clear();
        self.current_ref = pointer.map(str::to_string);
        if let Some(p) = pointer {
            self.tracker.insert(p.to_string());
        }
        self.in_all_of = false;
        self.is_property = false;
        self.depth = 0;
    }

    /// Records a recovered problem.
    ///
    /// A problem already recorded at the same location is not repeated; scope
    /// lookups compile some components more than once.
    pub fn diagnose(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let location = self.location();
        self.diagnose_at(kind, location, message);
    }

    /// Records a recovered problem at an explicit location, e.g. an operation key.
    pub fn diagnose_at(&mut self, kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) {
        let location = location.into();
        let message = message.into();
        let seen = self
            .diagnostics
            .iter()
            .any(|d| d.kind == kind && d.location == location && d.message == message);
        if !seen {
            self.diagnostics.push(Diagnostic::new(kind, location, message));
        }
    }

    /// Drains the collected diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn location(&self) -> String {
        self.current_ref.clone().unwrap_or_else(|| "<inline>".to_string())
    }

    pub(crate) fn cached_scopes(&self, pointer: &str) -> Option<&BTreeSet<Scope>> {
        self.scope_cache.get(pointer)
    }

    pub(crate) fn cache_scopes(&mut self, pointer: &str, scopes: BTreeSet<Scope>) {
        self.scope_cache.insert(pointer.to_string(), scopes);
    }
}

/// Recursive schema compiler bound to one document.
pub struct SchemaCompiler<'a> {
    pub(crate) root: &'a Value,
    pub(crate) adapter: &'a dyn DialectAdapter,
    max_depth: usize,
}

impl<'a> SchemaCompiler<'a> {
    /// Creates a compiler over `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - The (already transformed) document tree.
    /// * `adapter` - Dialect knowledge for type arrays, nullability and bounds.
    /// * `max_depth` - Recursion ceiling; exceeding it fails with `RecursionLimit`.
    pub fn new(root: &'a Value, adapter: &'a dyn DialectAdapter, max_depth: usize) -> Self {
        Self {
            root,
            adapter,
            max_depth,
        }
    }

    /// Compiles a named component, seeding cycle tracking with its own pointer.
    pub fn compile_component(&self, pointer: &str, schema: &Value, state: &mut CompileState) -> AppResult<IrSchema> {
        state.begin_walk(Some(pointer));
        let ir = self.compile(schema, state)?;
        state.cache_scopes(pointer, ir.access_scopes.clone());
        Ok(ir)
    }

    /// Compiles a free-standing schema (body, response, parameter).
    pub fn compile_root(&self, schema: &Value, state: &mut CompileState) -> AppResult<IrSchema> {
        state.begin_walk(None);
        self.compile(schema, state)
    }

    /// Compiles one node. Entry point of every recursive call.
    pub fn compile(&self, schema: &Value, state: &mut CompileState) -> AppResult<IrSchema> {
        let is_property = std::mem::take(&mut state.is_property);
        state.depth += 1;
        if state.depth > self.max_depth {
            return Err(AppError::RecursionLimit {
                pointer: state.location(),
                limit: self.max_depth,
            });
        }
        let result = self.dispatch(schema, state);
        state.depth -= 1;

        let mut ir = result?;
        if is_property && ir.access_scopes.is_empty() {
            ir.access_scopes.insert(Scope::Both);
        }
        Ok(ir)
    }

    fn dispatch(&self, schema: &Value, state: &mut CompileState) -> AppResult<IrSchema> {
        let map = match schema {
            Value::Object(map) => map,
            Value::Bool(true) => return Ok(IrSchema::of_type(SchemaType::Unknown)),
            Value::Bool(false) => return Ok(IrSchema::of_type(SchemaType::Never)),
            _ => {
                state.diagnose(DiagnosticKind::UnknownSchema, format!("schema is not a map: {schema}"));
                return Ok(IrSchema::of_type(SchemaType::Unknown));
            }
        };

        match SchemaKind::classify(map, self.adapter) {
            SchemaKind::Ref(pointer) => self.compile_ref(map, pointer, state),
            SchemaKind::Enum(values) => self.compile_enum(map, values, state),
            SchemaKind::AllOf(branches) => self.compile_all_of(map, branches, state),
            SchemaKind::AnyOf(branches) => self.compile_any_of(map, branches, state),
            SchemaKind::OneOf(branches) => self.compile_one_of(map, branches, state),
            SchemaKind::Type(types) => self.compile_types(map, &types, state),
            SchemaKind::Unknown => {
                let mut ir = self.init(map);
                self.apply_meta(map, &mut ir);
                // a bare `const` already inferred its type
                if ir.kind.is_none() {
                    if !is_annotation_only(map) {
                        state.diagnose(
                            DiagnosticKind::UnknownSchema,
                            "schema has no type, properties or composition keyword; compiled as unknown",
                        );
                    }
                    ir.kind = Some(SchemaType::Unknown);
                }
                Ok(ir)
            }
        }
    }

    /// Compiles a node with a known list of types.
    ///
    /// Several types compile once per type and combine with `or`; `null`
    /// contributes a bare `null` branch, and a literal `null` default is dropped
    /// from the non-null branches.
    pub(crate) fn compile_types(&self, map: &Map<String, Value>, types: &[String], state: &mut CompileState) -> AppResult<IrSchema> {
        let mut ir = self.init(map);
        self.apply_meta(map, &mut ir);

        if let [only] = types {
            return self.compile_one_type(map, only, ir, state);
        }

        let mut typed = IrSchema::default();
        self.apply_meta(map, &mut typed);
        if types.iter().any(|t| t == "null") && typed.default == Some(Value::Null) {
            typed.default = None;
        }

        let mut items = Vec::with_capacity(types.len());
        for ty in types {
            if ty == "null" {
                items.push(IrSchema::of_type(SchemaType::Null));
            } else {
                let branch = self.compile_one_type(map, ty, typed.clone(), state)?;
                ir.merge_scopes(&branch.access_scopes);
                items.push(branch);
            }
        }
        Ok(ir.add_items(items, LogicalOperator::Or, false))
    }

    /// Compiles `map` as exactly one type keyword, on top of `ir`.
    pub(crate) fn compile_one_type(&self, map: &Map<String, Value>, keyword: &str, mut ir: IrSchema, state: &mut CompileState) -> AppResult<IrSchema> {
        let keyword = self.adapter.normalize_type(keyword, &mut ir);
        match keyword {
            "array" => self.compile_array(map, ir, state),
            "object" => self.compile_object(map, ir, state),
            other => {
                ir.kind = Some(SchemaType::from_keyword(other).unwrap_or(SchemaType::Unknown));
                Ok(ir)
            }
        }
    }

    /// Documentation fields plus `x-` extensions.
    pub(crate) fn init(&self, map: &Map<String, Value>) -> IrSchema {
        let mut ir = IrSchema::default();
        if let Some(deprecated) = map.get("deprecated").and_then(Value::as_bool) {
            ir.deprecated = Some(deprecated);
        }
        if let Some(example) = map.get("example") {
            ir.example = Some(example.clone());
        }
        ir.description = non_empty_str(map, "description");
        ir.title = non_empty_str(map, "title");
        for (key, value) in map {
            if key.starts_with("x-") {
                ir.extensions.insert(key.clone(), value.clone());
            }
        }
        ir
    }

    /// Validation metadata and access scope.
    pub(crate) fn apply_meta(&self, map: &Map<String, Value>, ir: &mut IrSchema) {
        if let Some(value) = map.get("const") {
            ir.const_value = Some(value.clone());
            if !map.contains_key("type") {
                ir.kind = match value {
                    Value::Null => Some(SchemaType::Null),
                    Value::Number(_) => Some(SchemaType::Number),
                    Value::Bool(_) => Some(SchemaType::Boolean),
                    Value::String(_) => Some(SchemaType::String),
                    _ => ir.kind,
                };
            }
        }
        if let Some(default) = map.get("default") {
            ir.default = Some(default.clone());
        }
        self.adapter.numeric_bounds(map, ir);
        ir.format = non_empty_str(map, "format");
        ir.pattern = non_empty_str(map, "pattern");
        ir.max_items = map.get("maxItems").and_then(Value::as_u64);
        ir.min_items = map.get("minItems").and_then(Value::as_u64);
        ir.max_length = map.get("maxLength").and_then(Value::as_u64);
        ir.min_length = map.get("minLength").and_then(Value::as_u64);

        // readOnly wins when both flags are set
        if flag(map, "readOnly") {
            ir.access_scope = Some(Scope::Read);
            ir.access_scopes.insert(Scope::Read);
        } else if flag(map, "writeOnly") {
            ir.access_scope = Some(Scope::Write);
            ir.access_scopes.insert(Scope::Write);
        }
    }

    /// Type keywords of an arbitrary node (empty for non-maps).
    pub(crate) fn types_of(&self, node: &Value) -> Vec<String> {
        node.as_object()
            .map(|m| self.adapter.schema_types(m))
            .unwrap_or_default()
    }
}

/// `true` when the boolean keyword is present and set.
pub(crate) fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn non_empty_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Whether a schema only carries documentation, so `unknown` is what the author meant.
fn is_annotation_only(map: &Map<String, Value>) -> bool {
    map.keys().all(|key| {
        key.starts_with("x-")
            || matches!(
                key.as_str(),
                "description"
                    | "title"
                    | "example"
                    | "examples"
                    | "default"
                    | "deprecated"
                    | "readOnly"
                    | "writeOnly"
                    | "nullable"
                    | "externalDocs"
                    | "xml"
                    | "$comment"
                    | "$schema"
                    | "$id"
            )
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::compile_in;
    use super::*;
    use crate::oas::dialects::adapter_for;
    use crate::oas::document::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_classify_order() {
        let adapter = adapter_for(Dialect::V3_1);
        let both = json!({"$ref": "#/x", "enum": [1]});
        assert_eq!(
            SchemaKind::classify(both.as_object().unwrap(), adapter),
            SchemaKind::Ref("#/x")
        );
        let enum_and_all_of = json!({"enum": [1], "allOf": []});
        assert!(matches!(
            SchemaKind::classify(enum_and_all_of.as_object().unwrap(), adapter),
            SchemaKind::Enum(_)
        ));
        let props = json!({"properties": {"a": {}}});
        assert_eq!(
            SchemaKind::classify(props.as_object().unwrap(), adapter),
            SchemaKind::Type(vec!["object".to_string()])
        );
        let empty = json!({});
        assert_eq!(
            SchemaKind::classify(empty.as_object().unwrap(), adapter),
            SchemaKind::Unknown
        );
    }

    #[test]
    fn test_nullability_parity_between_dialects() {
        let (v30, _) = compile_in(&json!({}), Dialect::V3_0, &json!({"type": "string", "nullable": true}));
        let (v31, _) = compile_in(&json!({}), Dialect::V3_1, &json!({"type": ["string", "null"]}));
        assert_eq!(v30, v31);
        assert_eq!(v31.logical_operator, Some(LogicalOperator::Or));
        assert!(v31.items[0].is(SchemaType::String));
        assert!(v31.items[1].is(SchemaType::Null));
    }

    #[test]
    fn test_null_default_dropped_from_typed_branch() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_1,
            &json!({"type": ["integer", "null"], "default": null}),
        );
        assert_eq!(ir.default, Some(Value::Null));
        assert_eq!(ir.items[0].default, None);
        assert!(ir.items[0].is(SchemaType::Integer));
    }

    #[test]
    fn test_unknown_schema_diagnostic() {
        let (ir, diags) = compile_in(&json!({}), Dialect::V3_1, &json!({"format": "uuid"}));
        assert!(ir.is(SchemaType::Unknown));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnknownSchema);

        let (_, quiet) = compile_in(&json!({}), Dialect::V3_1, &json!({"description": "anything"}));
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_meta_and_extensions() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_1,
            &json!({
                "type": "string",
                "format": "email",
                "minLength": 3,
                "description": "Contact",
                "deprecated": true,
                "x-order": 2,
                "readOnly": true
            }),
        );
        assert!(ir.is(SchemaType::String));
        assert_eq!(ir.format.as_deref(), Some("email"));
        assert_eq!(ir.min_length, Some(3));
        assert_eq!(ir.description.as_deref(), Some("Contact"));
        assert_eq!(ir.deprecated, Some(true));
        assert_eq!(ir.extensions.get("x-order"), Some(&json!(2)));
        assert_eq!(ir.access_scope, Some(Scope::Read));
    }

    #[test]
    fn test_read_only_wins_over_write_only() {
        let (ir, _) = compile_in(
            &json!({}),
            Dialect::V3_0,
            &json!({"type": "string", "readOnly": true, "writeOnly": true}),
        );
        assert_eq!(ir.access_scope, Some(Scope::Read));
        assert_eq!(ir.access_scopes, BTreeSet::from([Scope::Read]));
    }

    #[test]
    fn test_const_infers_type() {
        let (ir, _) = compile_in(&json!({}), Dialect::V3_1, &json!({"const": "fixed"}));
        assert!(ir.is(SchemaType::String));
        assert_eq!(ir.const_value, Some(json!("fixed")));
    }

    #[test]
    fn test_boolean_schemas() {
        let (yes, _) = compile_in(&json!({}), Dialect::V3_1, &json!(true));
        let (no, _) = compile_in(&json!({}), Dialect::V3_1, &json!(false));
        assert!(yes.is(SchemaType::Unknown));
        assert!(no.is(SchemaType::Never));
    }

    #[test]
    fn test_recursion_ceiling_fails_closed() {
        let mut schema = json!({"type": "string"});
        for _ in 0..100 {
            schema = json!({"type": "array", "items": schema});
        }
        let compiler = SchemaCompiler::new(&Value::Null, adapter_for(Dialect::V3_1), 16);
        let mut state = CompileState::new();
        let err = compiler.compile_root(&schema, &mut state).unwrap_err();
        assert!(matches!(err, AppError::RecursionLimit { limit: 16, .. }));
    }
}

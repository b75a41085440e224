#![deny(missing_docs)]

//! # Document
//!
//! Owns the loaded document tree, its detected dialect, and the generational
//! ids of its named schemas.
//!
//! Transforms mutate the tree in place. Named schemas are inserted and removed
//! through this type so every replacement receives a fresh [`SchemaId`]; a
//! transform that captured an id earlier can then tell whether the schema now
//! stored under a name is still the one it saw.

use crate::error::{AppError, AppResult};
use crate::oas::ref_utils::{self, encode_pointer_segment};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Source dialect of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Swagger 2.0.
    V2,
    /// OpenAPI 3.0.x.
    V3_0,
    /// OpenAPI 3.1.x.
    V3_1,
}

impl Dialect {
    /// Detects the dialect from the root version marker.
    pub fn detect(root: &Value) -> AppResult<Self> {
        if let Some(swagger) = root.get("swagger") {
            return match swagger.as_str() {
                Some("2.0") => Ok(Dialect::V2),
                _ => Err(AppError::UnsupportedDocument(format!(
                    "swagger version {swagger} is not supported"
                ))),
            };
        }
        match root.get("openapi").and_then(Value::as_str) {
            Some(v) if v.starts_with("3.0.") || v == "3.0" => Ok(Dialect::V3_0),
            Some(v) if v.starts_with("3.1.") || v == "3.1" => Ok(Dialect::V3_1),
            Some(v) => Err(AppError::UnsupportedDocument(format!(
                "openapi version {v} is not supported"
            ))),
            None => Err(AppError::UnsupportedDocument(
                "missing `openapi` or `swagger` version field".into(),
            )),
        }
    }

    /// Path (from the root) of the named-schema map.
    pub fn schemas_path(&self) -> &'static [&'static str] {
        match self {
            Dialect::V2 => &["definitions"],
            Dialect::V3_0 | Dialect::V3_1 => &["components", "schemas"],
        }
    }

    /// Pointer prefix of named schemas, including the trailing slash.
    pub fn schemas_pointer_prefix(&self) -> &'static str {
        match self {
            Dialect::V2 => "#/definitions/",
            Dialect::V3_0 | Dialect::V3_1 => "#/components/schemas/",
        }
    }
}

/// Generational identity of a named schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

/// A loaded document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
    dialect: Dialect,
    schema_ids: HashMap<String, SchemaId>,
    next_id: u64,
}

impl Document {
    /// Wraps an already-parsed tree.
    ///
    /// # Errors
    ///
    /// `UnsupportedDocument` when no known version marker is present, and
    /// `InvalidDocument` when the root is not a map.
    pub fn from_value(root: Value) -> AppResult<Self> {
        if !root.is_object() {
            return Err(AppError::InvalidDocument("document root must be a map".into()));
        }
        let dialect = Dialect::detect(&root)?;
        let mut document = Self {
            root,
            dialect,
            schema_ids: HashMap::new(),
            next_id: 0,
        };
        for name in document.schema_names() {
            document.assign_id(&name);
        }
        tracing::debug!(?dialect, schemas = document.schema_ids.len(), "document loaded");
        Ok(document)
    }

    /// Parses JSON or YAML text.
    pub fn parse_str(text: &str) -> AppResult<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        Self::from_value(root)
    }

    /// The document tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Mutable access to the tree. Named schemas should go through
    /// [`Document::insert_schema`] / [`Document::remove_schema`].
    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Consumes the document, returning the tree.
    pub fn into_value(self) -> Value {
        self.root
    }

    /// The detected dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Resolves a pointer against the tree.
    pub fn resolve(&self, pointer: &str) -> AppResult<&Value> {
        ref_utils::resolve(&self.root, pointer)
    }

    /// The named-schema map, if present.
    pub fn schemas(&self) -> Option<&Map<String, Value>> {
        let mut current = &self.root;
        for segment in self.dialect.schemas_path() {
            current = current.get(*segment)?;
        }
        current.as_object()
    }

    /// The named-schema map, created when missing.
    fn schemas_mut(&mut self) -> &mut Map<String, Value> {
        let mut current = &mut self.root;
        for segment in self.dialect.schemas_path() {
            let map = ensure_object(current);
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current)
    }

    /// Names of every named schema, in document order.
    pub fn schema_names(&self) -> Vec<String> {
        self.schemas()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Pointer of the named schema `name`.
    pub fn schema_pointer(&self, name: &str) -> String {
        format!(
            "{}{}",
            self.dialect.schemas_pointer_prefix(),
            encode_pointer_segment(name)
        )
    }

    /// Current id of the schema stored under `name`.
    pub fn schema_id(&self, name: &str) -> Option<SchemaId> {
        self.schema_ids.get(name).copied()
    }

    /// Inserts (or replaces) a named schema, assigning a fresh id.
    pub fn insert_schema(&mut self, name: &str, schema: Value) -> SchemaId {
        self.schemas_mut().insert(name.to_string(), schema);
        self.assign_id(name)
    }

    /// Removes a named schema unconditionally.
    pub fn remove_schema(&mut self, name: &str) -> Option<Value> {
        self.schema_ids.remove(name);
        self.schemas_mut().shift_remove(name)
    }

    /// Removes the schema stored under `name` only if it still carries `id`.
    ///
    /// Returns whether anything was removed.
    pub fn remove_schema_if(&mut self, name: &str, id: SchemaId) -> bool {
        if self.schema_id(name) != Some(id) {
            return false;
        }
        self.remove_schema(name).is_some()
    }

    /// Removes the reusable component at `pointer` (`#/components/<kind>/<name>`,
    /// or a V2 top-level container member).
    ///
    /// Named schemas go through [`Document::remove_schema`] so their id is dropped too.
    pub fn remove_component(&mut self, pointer: &str) -> Option<Value> {
        let mut path = ref_utils::pointer_to_path(pointer);
        let name = path.pop()?;
        if path.iter().map(String::as_str).eq(self.dialect.schemas_path().iter().copied()) {
            return self.remove_schema(&name);
        }
        let mut current = &mut self.root;
        for segment in &path {
            current = current.get_mut(segment.as_str())?;
        }
        current.as_object_mut()?.shift_remove(&name)
    }

    fn assign_id(&mut self, name: &str) -> SchemaId {
        let id = SchemaId(self.next_id);
        self.next_id += 1;
        self.schema_ids.insert(name.to_string(), id);
        id
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_dialects() {
        assert_eq!(Dialect::detect(&json!({"swagger": "2.0"})).unwrap(), Dialect::V2);
        assert_eq!(Dialect::detect(&json!({"openapi": "3.0.3"})).unwrap(), Dialect::V3_0);
        assert_eq!(Dialect::detect(&json!({"openapi": "3.1.0"})).unwrap(), Dialect::V3_1);
    }

    #[test]
    fn test_rejects_unknown_versions() {
        assert!(matches!(
            Dialect::detect(&json!({"openapi": "4.0.0"})),
            Err(AppError::UnsupportedDocument(_))
        ));
        assert!(matches!(
            Dialect::detect(&json!({"swagger": "1.2"})),
            Err(AppError::UnsupportedDocument(_))
        ));
        assert!(Dialect::detect(&json!({"info": {}})).is_err());
        assert!(matches!(
            Document::from_value(json!([1, 2])),
            Err(AppError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_parse_yaml_and_schema_pointers() {
        let yaml = r#"
swagger: "2.0"
definitions:
  Pet:
    type: object
"#;
        let doc = Document::parse_str(yaml).unwrap();
        assert_eq!(doc.dialect(), Dialect::V2);
        assert_eq!(doc.schema_names(), vec!["Pet"]);
        assert_eq!(doc.schema_pointer("Pet"), "#/definitions/Pet");
        assert_eq!(doc.resolve("#/definitions/Pet/type").unwrap(), "object");
    }

    #[test]
    fn test_replacing_a_schema_changes_its_id() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.1.0",
            "components": {"schemas": {"Pet": {"type": "object"}}}
        }))
        .unwrap();
        let original = doc.schema_id("Pet").unwrap();
        let replacement = doc.insert_schema("Pet", json!({"type": "string"}));
        assert_ne!(original, replacement);

        // the captured id no longer matches, so nothing is removed
        assert!(!doc.remove_schema_if("Pet", original));
        assert!(doc.schemas().unwrap().contains_key("Pet"));

        assert!(doc.remove_schema_if("Pet", replacement));
        assert!(doc.schemas().unwrap().is_empty());
    }

    #[test]
    fn test_remove_component() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.0.3",
            "components": {
                "schemas": {"Pet": {"type": "object"}},
                "parameters": {"Limit": {"name": "limit", "in": "query"}, "a/b": {"name": "x", "in": "query"}}
            }
        }))
        .unwrap();
        assert!(doc.remove_component("#/components/schemas/Pet").is_some());
        assert_eq!(doc.schema_id("Pet"), None);
        assert!(doc.remove_component("#/components/parameters/a~1b").is_some());
        assert!(doc.remove_component("#/components/parameters/Missing").is_none());
        assert_eq!(
            doc.root()["components"]["parameters"],
            json!({"Limit": {"name": "limit", "in": "query"}})
        );
    }

    #[test]
    fn test_insert_creates_missing_containers() {
        let mut doc = Document::from_value(json!({"openapi": "3.0.0"})).unwrap();
        doc.insert_schema("Color", json!({"enum": ["red"]}));
        assert_eq!(doc.root()["components"]["schemas"]["Color"]["enum"][0], "red");
    }
}

#![deny(missing_docs)]

//! # Document Transforms
//!
//! Whole-document rewrites that run before compilation, in this order:
//!
//! 1. **filter**: drop operations the configuration does not select.
//! 2. **enums**: promote inline enums to named schemas, or inline named ones.
//! 3. **required**: optionally mark every declared property required.
//! 4. **read_write**: split schemas into read and write variants.
//!
//! **naming** holds the case and template helpers they share.

pub mod enums;
pub mod filter;
pub mod naming;
pub mod read_write;
pub mod required;

use crate::oas::document::Dialect;
use crate::oas::graph::{ChildKind, CHILD_SCHEMA_RELATIONSHIPS};
use serde_json::{Map, Value};

/// Keys whose values are literal data, never schemas or structure.
const LITERAL_KEYS: [&str; 5] = ["const", "default", "enum", "example", "examples"];

/// Keys whose values map member names to members.
const NAME_MAP_KEYS: [&str; 14] = [
    "$defs",
    "callbacks",
    "definitions",
    "dependentSchemas",
    "headers",
    "parameters",
    "pathItems",
    "paths",
    "patternProperties",
    "properties",
    "requestBodies",
    "responses",
    "schemas",
    "webhooks",
];

/// How the keys of a map read while walking the document.
///
/// Inside a name map such as `properties` or `responses`, `default` is a
/// member name and its value is walked like any other member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Keys {
    /// Keys are keywords of the enclosing object.
    Keywords,
    /// Keys are member names.
    Names,
}

impl Keys {
    /// Whether the value under `key` is literal data.
    pub(crate) fn is_literal(self, key: &str) -> bool {
        self == Keys::Keywords && LITERAL_KEYS.contains(&key)
    }

    /// How the keys of the map stored under `key` read.
    pub(crate) fn child(self, key: &str) -> Keys {
        if self == Keys::Keywords && NAME_MAP_KEYS.contains(&key) {
            Keys::Names
        } else {
            Keys::Keywords
        }
    }
}

/// Calls `f` on every schema map in the document.
///
/// Schemas are the members of the named-schema container, any value under a
/// `schema` key, and everything reachable from those through child keywords.
pub(crate) fn for_each_schema_mut(root: &mut Value, dialect: Dialect, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    let Some(top) = root.as_object_mut() else {
        return;
    };
    for (key, value) in top.iter_mut() {
        match (dialect, key.as_str()) {
            (Dialect::V2, "definitions") => visit_named(value, f),
            (Dialect::V3_0 | Dialect::V3_1, "components") => {
                if let Some(components) = value.as_object_mut() {
                    for (kind, members) in components.iter_mut() {
                        if kind == "schemas" {
                            visit_named(members, f);
                        } else {
                            find_schemas(members, Keys::Names, f);
                        }
                    }
                }
            }
            _ => find_schemas(value, Keys::Keywords.child(key), f),
        }
    }
}

fn visit_named(container: &mut Value, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    if let Some(map) = container.as_object_mut() {
        for schema in map.values_mut() {
            visit_schema(schema, f);
        }
    }
}

fn find_schemas(node: &mut Value, keys: Keys, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    match node {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if keys == Keys::Keywords && key == "schema" {
                    visit_schema(value, f);
                } else if !keys.is_literal(key) {
                    find_schemas(value, keys.child(key), f);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| find_schemas(item, Keys::Keywords, f)),
        _ => {}
    }
}

fn visit_schema(schema: &mut Value, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    let Some(map) = schema.as_object_mut() else {
        return;
    };
    f(map);
    for (keyword, kind) in CHILD_SCHEMA_RELATIONSHIPS {
        let Some(value) = map.get_mut(keyword) else {
            continue;
        };
        match (kind, value) {
            (ChildKind::Array | ChildKind::SingleOrArray, Value::Array(items)) => {
                items.iter_mut().for_each(|item| visit_schema(item, f));
            }
            (ChildKind::ObjectMap, Value::Object(children)) => {
                children.values_mut().for_each(|child| visit_schema(child, f));
            }
            (ChildKind::Single | ChildKind::SingleOrArray, child) if child.is_object() => {
                visit_schema(child, f);
            }
            _ => {}
        }
    }
}

#![deny(missing_docs)]

//! # Enum Transform
//!
//! Moves enums between the named-schema map and their use sites.
//!
//! * `root` promotes every inline enum to a named schema. Enums with the same
//!   type and value set share one schema, and an existing named enum with that
//!   signature is reused instead of creating a new one.
//! * `inline` copies every named enum into the sites that reference it and
//!   deletes the named schema.

use crate::config::{EnumsConfig, EnumsMode};
use crate::oas::document::Document;
use crate::oas::graph::has_structural_children;
use crate::oas::ref_utils::{encode_pointer_segment, ref_of};
use crate::oas::transforms::naming::{apply_naming, unique_component_name};
use crate::oas::transforms::Keys;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

/// Step from a node to one of its children.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// An inline enum found during the walk.
struct Site {
    path: Vec<Segment>,
    /// Name of the property or parameter holding the enum.
    hint: String,
    signature: String,
    schema: Value,
}

/// Structural identity of an enum: its `type` plus its values, order ignored.
///
/// Returns `None` for schemas without an `enum` list.
pub fn enum_signature(schema: &Value) -> Option<String> {
    let values = schema.get("enum")?.as_array()?;
    let mut sorted: Vec<String> = values.iter().map(Value::to_string).collect();
    sorted.sort();
    let kind = schema.get("type").cloned().unwrap_or_else(|| Value::String(String::new()));
    Some(json!({"type": kind, "values": sorted}).to_string())
}

/// Applies the configured enum mode. Returns the number of rewritten sites.
pub fn enums_transform(document: &mut Document, config: &EnumsConfig) -> usize {
    match config.mode {
        EnumsMode::Off => 0,
        EnumsMode::Root => promote_enums(document, config),
        EnumsMode::Inline => inline_enums(document),
    }
}

fn promote_enums(document: &mut Document, config: &EnumsConfig) -> usize {
    let named: IndexMap<String, Value> = document
        .schemas()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    let mut by_signature: HashMap<String, String> = HashMap::new();
    for (name, schema) in &named {
        if let Some(signature) = enum_signature(schema) {
            by_signature.entry(signature).or_insert_with(|| name.clone());
        }
    }

    let schemas_path: Vec<Segment> = document
        .dialect()
        .schemas_path()
        .iter()
        .map(|s| Segment::Key(s.to_string()))
        .collect();
    let mut sites = Vec::new();
    let mut path = Vec::new();
    collect_sites(document.root(), &mut path, "", Keys::Keywords, &schemas_path, &mut sites);
    if sites.is_empty() {
        return 0;
    }

    let mut taken: HashSet<String> = named.keys().cloned().collect();
    let mut promoted: Vec<(String, Value)> = Vec::new();
    let naming = config.naming();
    for site in &sites {
        if by_signature.contains_key(&site.signature) {
            continue;
        }
        let hint = site
            .schema
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(&site.hint);
        let name = unique_component_name(&apply_naming(hint, &naming), &taken);
        taken.insert(name.clone());
        by_signature.insert(site.signature.clone(), name.clone());
        promoted.push((name, site.schema.clone()));
    }

    let prefix = document.dialect().schemas_pointer_prefix();
    for (name, schema) in promoted {
        tracing::debug!(name = %name, "inline enum promoted");
        document.insert_schema(&name, schema);
    }

    // Deeper sites come after their ancestors, so replace back to front.
    let mut rewritten = 0;
    for site in sites.iter().rev() {
        let Some(name) = by_signature.get(&site.signature) else {
            continue;
        };
        if let Some(slot) = node_at_mut(document.root_mut(), &site.path) {
            *slot = json!({"$ref": format!("{prefix}{}", encode_pointer_segment(name))});
            rewritten += 1;
        }
    }
    rewritten
}

fn collect_sites(
    node: &Value,
    path: &mut Vec<Segment>,
    hint: &str,
    keys: Keys,
    schemas_path: &[Segment],
    sites: &mut Vec<Site>,
) {
    match node {
        Value::Object(map) => {
            if keys == Keys::Keywords && is_schema_like(map) && !is_named_schema(path, schemas_path) {
                if let Some(signature) = enum_signature(node) {
                    sites.push(Site {
                        path: path.clone(),
                        hint: hint.to_string(),
                        signature,
                        schema: node.clone(),
                    });
                }
            }
            for (key, value) in map {
                if keys.is_literal(key) {
                    continue;
                }
                // A parameter's schema is named after the parameter.
                let child_hint = match (key.as_str(), map.get("name").and_then(Value::as_str)) {
                    ("schema", Some(name)) => name,
                    _ => key.as_str(),
                };
                path.push(Segment::Key(key.clone()));
                collect_sites(value, path, child_hint, keys.child(key), schemas_path, sites);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                collect_sites(item, path, &index.to_string(), Keys::Keywords, schemas_path, sites);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Objects that may be schemas. Parameter objects carry V2 enums directly and
/// are left alone.
fn is_schema_like(map: &Map<String, Value>) -> bool {
    if map.contains_key("in") && map.contains_key("name") {
        return false;
    }
    map.contains_key("type") || map.contains_key("enum") || has_structural_children(map)
}

fn is_named_schema(path: &[Segment], schemas_path: &[Segment]) -> bool {
    path.len() == schemas_path.len() + 1 && path.starts_with(schemas_path)
}

fn node_at_mut<'a>(root: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = match (current, segment) {
            (Value::Object(map), Segment::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), Segment::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn inline_enums(document: &mut Document) -> usize {
    let targets: HashMap<String, (String, Value)> = document
        .schemas()
        .map(|schemas| {
            schemas
                .iter()
                .filter(|(_, schema)| enum_signature(schema).is_some())
                .map(|(name, schema)| (document.schema_pointer(name), (name.clone(), schema.clone())))
                .collect()
        })
        .unwrap_or_default();
    if targets.is_empty() {
        return 0;
    }

    let mut rewritten = 0;
    replace_refs(document.root_mut(), Keys::Keywords, &targets, &mut rewritten);
    for (name, _) in targets.values() {
        tracing::debug!(name = %name, "named enum inlined");
        document.remove_schema(name);
    }
    rewritten
}

fn replace_refs(node: &mut Value, keys: Keys, targets: &HashMap<String, (String, Value)>, rewritten: &mut usize) {
    let replacement = ref_of(node).and_then(|pointer| targets.get(pointer)).map(|(_, schema)| schema);
    if let (Some(schema), Value::Object(siblings)) = (replacement, &*node) {
        let mut merged = schema.as_object().cloned().unwrap_or_default();
        for (key, value) in siblings {
            if key != "$ref" {
                merged.insert(key.clone(), value.clone());
            }
        }
        *node = Value::Object(merged);
        *rewritten += 1;
        return;
    }
    match node {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if !keys.is_literal(key) {
                    replace_refs(value, keys.child(key), targets, rewritten);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| replace_refs(item, Keys::Keywords, targets, rewritten)),
        _ => {}
    }
}

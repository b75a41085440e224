#![deny(missing_docs)]

//! # Reference Utilities
//!
//! JSON Pointer helpers shared by the compilers and the transforms.
//!
//! Pointers are always local (`#/...`); remote documents are never fetched.

use crate::error::{AppError, AppResult};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Splits a `#/a/b~1c` pointer into decoded path segments (`["a", "b/c"]`).
pub fn pointer_to_path(pointer: &str) -> Vec<String> {
    let trimmed = pointer.trim_start_matches('#');
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(decode_pointer_segment).collect()
}

/// Joins path segments back into an encoded `#/...` pointer.
pub fn path_to_pointer<S: AsRef<str>>(path: &[S]) -> String {
    let mut pointer = String::from("#");
    for segment in path {
        pointer.push('/');
        pointer.push_str(&encode_pointer_segment(segment.as_ref()));
    }
    pointer
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded).decode_utf8_lossy().into_owned()
}

/// Encodes a raw key as a JSON Pointer segment.
pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// The last path segment of a pointer, e.g. `Pet` for `#/components/schemas/Pet`.
pub fn ref_to_name(pointer: &str) -> String {
    pointer_to_path(pointer).pop().unwrap_or_default()
}

/// Whether the pointer names a reusable component rather than a nested node.
///
/// `#/components/<kind>/<name>` for V3 and `#/definitions|parameters|responses/<name>`
/// for V2. Deeper pointers (`#/components/schemas/Pet/properties/id`) are not components.
pub fn is_top_level_component(pointer: &str) -> bool {
    let path = pointer_to_path(pointer);
    match path.first().map(String::as_str) {
        Some("components") => path.len() == 3,
        Some("definitions") | Some("parameters") | Some("responses") => path.len() == 2,
        _ => false,
    }
}

/// Resolves a pointer against the document root.
///
/// # Arguments
///
/// * `root` - The whole document.
/// * `pointer` - A local `#/...` pointer.
///
/// # Errors
///
/// `UnresolvedReference` naming the pointer when any segment is missing.
pub fn resolve<'a>(root: &'a Value, pointer: &str) -> AppResult<&'a Value> {
    if !pointer.starts_with('#') {
        return Err(AppError::unresolved(pointer));
    }
    let mut current = root;
    for segment in pointer_to_path(pointer) {
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| AppError::unresolved(pointer))?;
    }
    Ok(current)
}

/// Mutable variant of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut Value, pointer: &str) -> AppResult<&'a mut Value> {
    if !pointer.starts_with('#') {
        return Err(AppError::unresolved(pointer));
    }
    let mut current = root;
    for segment in pointer_to_path(pointer) {
        current = match current {
            Value::Object(map) => map.get_mut(&segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |i| items.get_mut(i)),
            _ => None,
        }
        .ok_or_else(|| AppError::unresolved(pointer))?;
    }
    Ok(current)
}

/// Follows `$ref` chains and merges the referencing node's siblings over the target.
///
/// Sibling fields win over resolved fields ("extended" `$ref`). Nodes without a
/// `$ref` are returned as clones.
///
/// # Errors
///
/// `UnresolvedReference` for a missing target or a `$ref` loop.
pub fn dereference(root: &Value, node: &Value) -> AppResult<Value> {
    let mut visited = HashSet::new();
    dereference_inner(root, node, &mut visited)
}

fn dereference_inner(root: &Value, node: &Value, visited: &mut HashSet<String>) -> AppResult<Value> {
    let Some(pointer) = ref_of(node) else {
        return Ok(node.clone());
    };
    if !visited.insert(pointer.to_string()) {
        return Err(AppError::unresolved(pointer));
    }
    let target = dereference_inner(root, resolve(root, pointer)?, visited)?;
    let Value::Object(siblings) = node else {
        return Ok(target);
    };
    let mut merged = match target {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    for (key, value) in siblings {
        if key != "$ref" {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

/// The `$ref` string of a node, if it has one.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Resolves a node that may be a `$ref`, returning the target object map.
///
/// Non-object targets are reported as unresolved so callers can treat the
/// result as a map.
pub fn resolve_object<'a>(root: &'a Value, node: &'a Value) -> AppResult<&'a Map<String, Value>> {
    let mut current = node;
    let mut visited = HashSet::new();
    while let Some(pointer) = ref_of(current) {
        if !visited.insert(pointer) {
            return Err(AppError::unresolved(pointer));
        }
        current = resolve(root, pointer)?;
    }
    current
        .as_object()
        .ok_or_else(|| AppError::InvalidDocument(format!("expected an object at {}", ref_of(node).unwrap_or("<inline>"))))
}

#![deny(missing_docs)]

//! # Read/Write Split
//!
//! Splits every named schema that carries `readOnly` or `writeOnly` members
//! (directly or through its references) into a read variant, used in
//! responses, and a write variant, used in request bodies and parameters.
//!
//! The pass runs in four steps:
//!
//! 1. capture the [`SchemaId`] of every named schema;
//! 2. prune two clones of each candidate and name the variants;
//! 3. rewrite every `$ref` to a split schema according to where it appears;
//! 4. delete the originals that still carry their captured id.

use crate::config::ReadWriteConfig;
use crate::ir::Scope;
use crate::logger::Logger;
use crate::oas::document::{Document, SchemaId};
use crate::oas::graph::{has_structural_children, ChildKind, Graph, CHILD_SCHEMA_RELATIONSHIPS};
use crate::oas::ref_utils::encode_pointer_segment;
use crate::oas::transforms::naming::{apply_naming, unique_component_name};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Keys under which a schema starts when walking for `$ref` rewrites.
const SCHEMA_KEYS: [&str; 10] = [
    "additionalProperties",
    "allOf",
    "anyOf",
    "items",
    "not",
    "oneOf",
    "patternProperties",
    "prefixItems",
    "properties",
    "schema",
];

/// Pointers of the two variants of one split schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitVariants {
    /// Pointer of the read (response) variant.
    pub read: String,
    /// Pointer of the write (request) variant.
    pub write: String,
}

/// Result of the split step.
#[derive(Debug, Default)]
pub struct SplitSchemas {
    /// Variants keyed by the pointer of the original.
    pub mapping: IndexMap<String, SplitVariants>,
    /// Original pointer keyed by variant pointer.
    reverse: HashMap<String, String>,
    /// New schemas in insertion order.
    schemas: Vec<(String, Value)>,
}

/// Runs the split against a graph built from the current document.
///
/// Returns the number of schemas split.
pub fn read_write_transform(
    document: &mut Document,
    config: &ReadWriteConfig,
    graph: &Graph,
    logger: &mut Logger,
) -> usize {
    if !config.enabled {
        return 0;
    }

    let token = logger.begin("capture-original-schemas");
    let originals: HashMap<String, SchemaId> = document
        .schema_names()
        .into_iter()
        .filter_map(|name| document.schema_id(&name).map(|id| (name, id)))
        .collect();
    logger.end(token);

    let token = logger.begin("split-schemas");
    let split = split_schemas(document, config, graph);
    logger.end(token);

    let token = logger.begin("insert-split-schemas");
    for (name, schema) in &split.schemas {
        document.insert_schema(name, schema.clone());
    }
    logger.end(token);

    let token = logger.begin("update-refs-in-spec");
    let rewritten = update_refs(document, &split);
    logger.end(token);

    let token = logger.begin("remove-original-split-schemas");
    let prefix = document.dialect().schemas_pointer_prefix();
    for pointer in split.mapping.keys() {
        let Some(name) = schema_name(pointer, prefix) else {
            continue;
        };
        if let Some(id) = originals.get(&name) {
            document.remove_schema_if(&name, *id);
        }
    }
    logger.end(token);

    tracing::debug!(split = split.mapping.len(), rewritten, "read/write split applied");
    split.mapping.len()
}

/// Decides which named schemas split and builds their pruned variants.
pub fn split_schemas(document: &Document, config: &ReadWriteConfig, graph: &Graph) -> SplitSchemas {
    let prefix = document.dialect().schemas_pointer_prefix();
    let mut split = SplitSchemas::default();
    let mut existing: HashSet<String> = graph
        .nodes
        .keys()
        .filter_map(|pointer| schema_name(pointer, prefix))
        .collect();

    for (pointer, node) in &graph.nodes {
        let Some(name) = schema_name(pointer, prefix) else {
            continue;
        };
        if !graph.has_access_scope(pointer) {
            continue;
        }

        let mut read = node.node.clone();
        let mut write = node.node.clone();
        if prune(graph, &mut read, Dropped::WriteOnly) || prune(graph, &mut write, Dropped::ReadOnly) {
            tracing::debug!(schema = %name, "variant would be empty; not split");
            continue;
        }

        let references_split = graph
            .transitive_dependencies
            .get(pointer)
            .is_some_and(|deps| deps.iter().any(|dep| graph.has_access_scope(dep)));
        if !references_split && read == write && read == node.node {
            continue;
        }

        let read_base = apply_naming(&name, &config.responses);
        let read_name = if read_base == name {
            read_base
        } else {
            unique_component_name(&read_base, &existing)
        };
        existing.insert(read_name.clone());

        let write_base = apply_naming(&name, &config.requests);
        let write_name = if write_base == name && write_base != read_name {
            write_base
        } else {
            unique_component_name(&write_base, &existing)
        };
        existing.insert(write_name.clone());

        let variants = SplitVariants {
            read: format!("{prefix}{}", encode_pointer_segment(&read_name)),
            write: format!("{prefix}{}", encode_pointer_segment(&write_name)),
        };
        split.reverse.insert(variants.read.clone(), pointer.clone());
        split.reverse.insert(variants.write.clone(), pointer.clone());
        split.mapping.insert(pointer.clone(), variants);
        split.schemas.push((read_name, read));
        split.schemas.push((write_name, write));
    }
    split
}

/// Name of a named schema from its pointer; `None` for deeper pointers.
fn schema_name(pointer: &str, prefix: &str) -> Option<String> {
    let rest = pointer.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.replace("~1", "/").replace("~0", "~"))
}

/// The access flag a variant leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dropped {
    ReadOnly,
    WriteOnly,
}

impl Dropped {
    fn flag(self) -> &'static str {
        match self {
            Dropped::ReadOnly => "readOnly",
            Dropped::WriteOnly => "writeOnly",
        }
    }

    fn scope(self) -> Scope {
        match self {
            Dropped::ReadOnly => Scope::Read,
            Dropped::WriteOnly => Scope::Write,
        }
    }
}

fn is_flagged(schema: &Value, flag: &str) -> bool {
    schema.get(flag).and_then(Value::as_bool) == Some(true)
}

/// Removes every child marked with the flag of `excluded`, and every `$ref`
/// to a schema that carries nothing but `excluded`.
///
/// Returns whether the schema itself should be dropped by its parent.
fn prune(graph: &Graph, schema: &mut Value, excluded: Dropped) -> bool {
    let Value::Object(map) = schema else {
        return false;
    };
    let excluded_ref = map
        .get("$ref")
        .and_then(Value::as_str)
        .is_some_and(|pointer| graph.is_exclusively(pointer, excluded.scope()));
    if excluded_ref {
        map.shift_remove("$ref");
        if !has_structural_children(map) {
            return true;
        }
    }

    let flag = excluded.flag();
    for (keyword, kind) in CHILD_SCHEMA_RELATIONSHIPS {
        let Some(value) = map.get_mut(keyword) else {
            continue;
        };
        let mut removed = Vec::new();
        let drop_keyword = match (kind, value) {
            (ChildKind::Array | ChildKind::SingleOrArray, Value::Array(items)) => {
                items.retain_mut(|item| !is_flagged(item, flag) && !prune(graph, item, excluded));
                items.is_empty()
            }
            (ChildKind::ObjectMap, Value::Object(children)) => {
                children.retain(|key, child| {
                    let keep = !is_flagged(child, flag) && !prune(graph, child, excluded);
                    if !keep {
                        removed.push(key.clone());
                    }
                    keep
                });
                children.is_empty()
            }
            (ChildKind::Single | ChildKind::SingleOrArray, child) if child.is_object() => {
                is_flagged(child, flag) || prune(graph, child, excluded)
            }
            _ => false,
        };
        if keyword == "properties" && !removed.is_empty() {
            drop_required(map, &removed);
        }
        if drop_keyword {
            map.shift_remove(keyword);
        }
    }

    map.get("type").and_then(Value::as_str) == Some("object") && !has_structural_children(map)
}

fn drop_required(map: &mut Map<String, Value>, removed: &[String]) {
    let Some(Value::Array(required)) = map.get_mut("required") else {
        return;
    };
    required.retain(|name| name.as_str().map_or(true, |n| !removed.iter().any(|r| r == n)));
    if required.is_empty() {
        map.shift_remove("required");
    }
}

/// Context a component container imposes on everything inside it.
fn component_context(path: &[String]) -> Option<Scope> {
    match path {
        [components, kind, _] if components == "components" => match kind.as_str() {
            "parameters" | "requestBodies" => Some(Scope::Write),
            "responses" | "headers" => Some(Scope::Read),
            _ => None,
        },
        [kind, _] => match kind.as_str() {
            "parameters" => Some(Scope::Write),
            "responses" => Some(Scope::Read),
            _ => None,
        },
        _ => None,
    }
}

struct RefRewriter<'a> {
    split: &'a SplitSchemas,
    prefix: &'static str,
    schemas_path: &'static [&'static str],
    rewritten: usize,
}

impl RefRewriter<'_> {
    fn is_named_schema(&self, path: &[String]) -> bool {
        path.len() == self.schemas_path.len() + 1
            && path.iter().zip(self.schemas_path).all(|(a, b)| a == b)
    }

    fn walk(&mut self, node: &mut Value, path: &mut Vec<String>, context: Option<Scope>, in_schema: bool) {
        match node {
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    path.push(index.to_string());
                    self.walk(item, path, context, in_schema);
                    path.pop();
                }
            }
            Value::Object(map) => self.walk_map(map, path, context, in_schema),
            _ => {}
        }
    }

    fn walk_child(
        &mut self,
        value: &mut Value,
        path: &mut Vec<String>,
        key: &str,
        context: Option<Scope>,
        in_schema: bool,
    ) {
        path.push(key.to_string());
        self.walk(value, path, context, in_schema);
        path.pop();
    }

    fn walk_map(
        &mut self,
        map: &mut Map<String, Value>,
        path: &mut Vec<String>,
        context: Option<Scope>,
        in_schema: bool,
    ) {
        let mut context = context;
        // A split variant fixes the context of everything nested in it.
        if let Some(name) = path.last().filter(|_| self.is_named_schema(path.as_slice())) {
            let pointer = format!("{}{}", self.prefix, encode_pointer_segment(name));
            if let Some(variants) = self
                .split
                .reverse
                .get(&pointer)
                .and_then(|original| self.split.mapping.get(original))
            {
                if variants.read == pointer {
                    context = Some(Scope::Read);
                } else if variants.write == pointer {
                    context = Some(Scope::Write);
                }
            }
        }

        if let Some(component) = component_context(path) {
            for (key, value) in map.iter_mut() {
                self.walk_child(value, path, key, Some(component), false);
            }
            return;
        }

        for (key, value) in map.iter_mut() {
            if !in_schema {
                match (key.as_str(), &mut *value) {
                    ("requestBody", value) => {
                        self.walk_child(value, path, key, Some(Scope::Write), false);
                        continue;
                    }
                    ("responses", value) => {
                        self.walk_child(value, path, key, Some(Scope::Read), false);
                        continue;
                    }
                    ("parameters", Value::Array(parameters)) => {
                        path.push(key.clone());
                        for (index, parameter) in parameters.iter_mut().enumerate() {
                            let Value::Object(parameter) = parameter else {
                                continue;
                            };
                            path.push(index.to_string());
                            if let Some(schema) = parameter.get_mut("schema") {
                                self.walk_child(schema, path, "schema", Some(Scope::Write), true);
                            }
                            if let Some(content) = parameter.get_mut("content") {
                                self.walk_child(content, path, "content", Some(Scope::Write), false);
                            }
                            path.pop();
                        }
                        path.pop();
                        continue;
                    }
                    ("headers", Value::Object(headers)) => {
                        path.push(key.clone());
                        for (name, header) in headers.iter_mut() {
                            self.walk_child(header, path, name, Some(Scope::Read), false);
                        }
                        path.pop();
                        continue;
                    }
                    _ => {}
                }
            }

            if SCHEMA_KEYS.contains(&key.as_str()) {
                self.walk_child(value, path, key, context, true);
            } else if key == "$ref" {
                let target = value
                    .as_str()
                    .and_then(|pointer| self.split.mapping.get(pointer))
                    .map(|variants| match context {
                        Some(Scope::Write) => variants.write.clone(),
                        _ => variants.read.clone(),
                    });
                if let Some(target) = target {
                    *value = Value::String(target);
                    self.rewritten += 1;
                }
            } else {
                self.walk_child(value, path, key, context, in_schema);
            }
        }
    }
}

/// Points every `$ref` to a split original at the variant its context selects.
///
/// Returns the number of rewritten references.
pub fn update_refs(document: &mut Document, split: &SplitSchemas) -> usize {
    if split.mapping.is_empty() {
        return 0;
    }
    let dialect = document.dialect();
    let mut rewriter = RefRewriter {
        split,
        prefix: dialect.schemas_pointer_prefix(),
        schemas_path: dialect.schemas_path(),
        rewritten: 0,
    };
    let mut path = Vec::new();
    rewriter.walk(document.root_mut(), &mut path, None, false);
    rewriter.rewritten
}

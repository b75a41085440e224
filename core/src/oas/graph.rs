#![deny(missing_docs)]

//! # Dependency Graph
//!
//! One pass over the named parts of a document. Every named schema (and every
//! reusable parameter, request body, response and header) becomes a node that
//! records the `$ref`s found in its subtree, its access scopes and whether it is
//! deprecated. Transitive dependencies are computed once, and scopes flow from
//! dependencies into their dependents.

use crate::ir::Scope;
use crate::oas::document::{Dialect, Document};
use crate::oas::ref_utils::{encode_pointer_segment, ref_of};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

/// How a schema keyword holds its child schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// One schema.
    Single,
    /// A list of schemas.
    Array,
    /// A name to schema map.
    ObjectMap,
    /// One schema or a list (V2-style tuple `items`).
    SingleOrArray,
}

/// Keywords that hold child schemas. Shared by the graph walk and the read/write pruner.
pub const CHILD_SCHEMA_RELATIONSHIPS: [(&str, ChildKind); 16] = [
    ("$defs", ChildKind::ObjectMap),
    ("additionalProperties", ChildKind::Single),
    ("allOf", ChildKind::Array),
    ("anyOf", ChildKind::Array),
    ("contains", ChildKind::Single),
    ("dependentSchemas", ChildKind::ObjectMap),
    ("else", ChildKind::Single),
    ("if", ChildKind::Single),
    ("items", ChildKind::SingleOrArray),
    ("not", ChildKind::Single),
    ("oneOf", ChildKind::Array),
    ("patternProperties", ChildKind::ObjectMap),
    ("prefixItems", ChildKind::Array),
    ("properties", ChildKind::ObjectMap),
    ("propertyNames", ChildKind::Single),
    ("then", ChildKind::Single),
];

/// Whether `schema` still has any structural child keyword.
pub fn has_structural_children(schema: &Map<String, Value>) -> bool {
    CHILD_SCHEMA_RELATIONSHIPS
        .iter()
        .any(|(keyword, _)| schema.contains_key(*keyword))
}

/// Child schemas of `schema`, paired with the keyword and (for maps) the key they sit under.
pub fn child_schemas(schema: &Map<String, Value>) -> Vec<(&'static str, Option<&str>, &Value)> {
    let mut children = Vec::new();
    for (keyword, kind) in CHILD_SCHEMA_RELATIONSHIPS {
        let Some(value) = schema.get(keyword) else {
            continue;
        };
        match (kind, value) {
            (ChildKind::Array | ChildKind::SingleOrArray, Value::Array(items)) => {
                children.extend(items.iter().map(|item| (keyword, None, item)));
            }
            (ChildKind::ObjectMap, Value::Object(map)) => {
                children.extend(map.iter().map(|(k, v)| (keyword, Some(k.as_str()), v)));
            }
            (ChildKind::Single | ChildKind::SingleOrArray, Value::Object(_)) => {
                children.push((keyword, None, value));
            }
            _ => {}
        }
    }
    children
}

/// A named part of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// The raw (dialect-shaped) node.
    #[serde(skip)]
    pub node: Value,
    /// Scopes observed in the subtree, including those of its dependencies.
    pub scopes: BTreeSet<Scope>,
    /// `$ref` pointers found directly in the subtree.
    pub dependencies: BTreeSet<String>,
    /// Deprecation flag of the node itself.
    pub deprecated: bool,
}

/// Dependency graph of a document.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Nodes keyed by pointer, in document order.
    pub nodes: IndexMap<String, GraphNode>,
    /// Every pointer reachable from a node, keyed by the node's pointer.
    pub transitive_dependencies: HashMap<String, BTreeSet<String>>,
}

impl Graph {
    /// Whether the node at `pointer` carries exactly the one scope `scope`.
    pub fn is_exclusively(&self, pointer: &str, scope: Scope) -> bool {
        self.nodes
            .get(pointer)
            .is_some_and(|n| n.scopes.len() == 1 && n.scopes.contains(&scope))
    }

    /// Whether the node at `pointer` is reachable from a `readOnly` or `writeOnly` leaf.
    pub fn has_access_scope(&self, pointer: &str) -> bool {
        self.nodes.get(pointer).is_some_and(|n| {
            n.scopes.contains(&Scope::Read) || n.scopes.contains(&Scope::Write)
        })
    }
}

/// Builds the dependency graph of `document`.
pub fn build_graph(document: &Document) -> Graph {
    let root = document.root();
    let dialect = document.dialect();
    let mut graph = Graph::default();

    for &(path, is_schema) in named_containers(dialect) {
        let Some(container) = map_at_path(root, path) else {
            continue;
        };
        for (name, node) in container {
            let mut pointer = String::from("#");
            for segment in path {
                pointer.push('/');
                pointer.push_str(segment);
            }
            pointer.push('/');
            pointer.push_str(&encode_pointer_segment(name));

            let mut dependencies = BTreeSet::new();
            let scopes = if is_schema {
                schema_scopes(node, &mut dependencies)
            } else {
                container_scopes(node, &mut dependencies)
            };
            let deprecated = node.get("deprecated").and_then(Value::as_bool).unwrap_or(false);
            graph.nodes.insert(
                pointer,
                GraphNode {
                    node: node.clone(),
                    scopes,
                    dependencies,
                    deprecated,
                },
            );
        }
    }

    graph.transitive_dependencies = transitive_closure(&graph.nodes);

    // Scopes flow from every reachable dependency into the dependent node.
    let inherited: Vec<(String, BTreeSet<Scope>)> = graph
        .nodes
        .keys()
        .map(|pointer| {
            let mut scopes = BTreeSet::new();
            for dep in graph.transitive_dependencies.get(pointer).into_iter().flatten() {
                if let Some(node) = graph.nodes.get(dep) {
                    scopes.extend(node.scopes.iter().copied());
                }
            }
            (pointer.clone(), scopes)
        })
        .collect();
    for (pointer, scopes) in inherited {
        if let Some(node) = graph.nodes.get_mut(&pointer) {
            node.scopes.extend(scopes);
        }
    }

    tracing::debug!(nodes = graph.nodes.len(), "dependency graph built");
    graph
}

/// Containers of named parts, and whether their members are schemas.
fn named_containers(dialect: Dialect) -> &'static [(&'static [&'static str], bool)] {
    match dialect {
        Dialect::V2 => &[
            (&["definitions"], true),
            (&["parameters"], false),
            (&["responses"], false),
        ],
        Dialect::V3_0 | Dialect::V3_1 => &[
            (&["components", "schemas"], true),
            (&["components", "parameters"], false),
            (&["components", "requestBodies"], false),
            (&["components", "responses"], false),
            (&["components", "headers"], false),
        ],
    }
}

fn map_at_path<'r>(root: &'r Value, path: &[&str]) -> Option<&'r Map<String, Value>> {
    let mut current = root;
    for segment in path {
        current = current.get(*segment)?;
    }
    current.as_object()
}

/// Scopes of a schema subtree, collecting `$ref`s along the way.
///
/// `readOnly` wins over `writeOnly` when both are set. A property without any
/// scope of its own contributes `both`.
pub fn schema_scopes(schema: &Value, dependencies: &mut BTreeSet<String>) -> BTreeSet<Scope> {
    let mut scopes = BTreeSet::new();
    let Some(map) = schema.as_object() else {
        return scopes;
    };
    if let Some(pointer) = ref_of(schema) {
        dependencies.insert(pointer.to_string());
    }

    for (keyword, _, child) in child_schemas(map) {
        let child_scopes = schema_scopes(child, dependencies);
        if keyword == "properties" && child_scopes.is_empty() {
            scopes.insert(Scope::Both);
        } else {
            scopes.extend(child_scopes);
        }
    }

    if flag(map, "readOnly") {
        return BTreeSet::from([Scope::Read]);
    }
    if flag(map, "writeOnly") {
        return BTreeSet::from([Scope::Write]);
    }
    scopes
}

/// Scopes of a non-schema component (parameter, body, response, header).
///
/// Only values under a `schema` key are schemas; `$ref`s anywhere else are
/// dependencies on other components.
fn container_scopes(node: &Value, dependencies: &mut BTreeSet<String>) -> BTreeSet<Scope> {
    let mut scopes = BTreeSet::new();
    match node {
        Value::Object(map) => {
            if let Some(pointer) = ref_of(node) {
                dependencies.insert(pointer.to_string());
            }
            for (key, value) in map {
                match key.as_str() {
                    "schema" => scopes.extend(schema_scopes(value, dependencies)),
                    "example" | "examples" => {}
                    _ => scopes.extend(container_scopes(value, dependencies)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                scopes.extend(container_scopes(item, dependencies));
            }
        }
        _ => {}
    }
    scopes
}

/// `$ref` pointers found anywhere in a non-schema node, such as an operation.
pub fn references(node: &Value) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();
    container_scopes(node, &mut dependencies);
    dependencies
}

/// Memoised DFS over direct dependencies.
///
/// A closure is cached only once it is complete, so cycles never leave a
/// partial set behind.
fn transitive_closure(nodes: &IndexMap<String, GraphNode>) -> HashMap<String, BTreeSet<String>> {
    let mut memo: HashMap<String, BTreeSet<String>> = HashMap::new();
    for pointer in nodes.keys() {
        let mut reached = BTreeSet::new();
        let mut visited = HashSet::from([pointer.clone()]);
        let mut stack: Vec<&str> = vec![pointer.as_str()];
        while let Some(current) = stack.pop() {
            let Some(node) = nodes.get(current) else {
                continue;
            };
            for dep in &node.dependencies {
                reached.insert(dep.clone());
                if !visited.insert(dep.clone()) {
                    continue;
                }
                match memo.get(dep) {
                    Some(done) => {
                        for d in done {
                            reached.insert(d.clone());
                            visited.insert(d.clone());
                        }
                    }
                    None => stack.push(dep.as_str()),
                }
            }
        }
        memo.insert(pointer.clone(), reached);
    }
    memo
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

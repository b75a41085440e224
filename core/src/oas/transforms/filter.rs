#![deny(missing_docs)]

//! # Document Filter
//!
//! Keeps the part of a document the configuration selects.
//!
//! * Components are excluded by name or deprecation, and so is every component
//!   that depends on an excluded one.
//! * Operations are excluded by key, tag or deprecation, or when they
//!   reference an excluded component.
//! * With orphan pruning, components that no remaining operation reaches are
//!   removed as well.
//!
//! A path item loses its entry only when the filter removed its last
//! operation. Items that are a bare `$ref` are never touched.

use crate::config::{regex_body, FiltersConfig, IncludeExclude};
use crate::error::{AppError, AppResult};
use crate::ir::{operation_key, HttpMethod};
use crate::oas::document::{Dialect, Document};
use crate::oas::graph::{build_graph, references, Graph};
use crate::oas::ref_utils::{ref_of, ref_to_name, resolve};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

enum Pattern {
    Name(String),
    Regex(Regex),
}

impl Pattern {
    fn parse(list: &str, text: &str) -> AppResult<Self> {
        match regex_body(text) {
            Some(body) => Regex::new(body)
                .map(Pattern::Regex)
                .map_err(|e| AppError::Config(format!("{list}: `{text}`: {e}"))),
            None => Ok(Pattern::Name(text.to_string())),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Name(n) => n == name,
            Pattern::Regex(re) => re.is_match(name),
        }
    }
}

/// A compiled include/exclude list.
struct Selector {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl Selector {
    fn new(list_key: &str, list: &IncludeExclude) -> AppResult<Self> {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| Pattern::parse(list_key, p))
                .collect::<AppResult<Vec<_>>>()
        };
        Ok(Self {
            include: compile(&list.include)?,
            exclude: compile(&list.exclude)?,
        })
    }

    fn keeps(&self, name: &str) -> bool {
        self.keeps_any(&[name])
    }

    /// Any excluded name drops the set; a non-empty include needs one match.
    fn keeps_any(&self, names: &[&str]) -> bool {
        let hit = |patterns: &[Pattern]| names.iter().any(|n| patterns.iter().any(|p| p.matches(n)));
        if hit(&self.exclude) {
            return false;
        }
        self.include.is_empty() || hit(&self.include)
    }
}

/// Component kinds with their own filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentKind {
    Schema,
    Parameter,
    RequestBody,
    Response,
}

fn component_kind(dialect: Dialect, pointer: &str) -> Option<ComponentKind> {
    let containers: &[(&str, ComponentKind)] = match dialect {
        Dialect::V2 => &[
            ("#/definitions/", ComponentKind::Schema),
            ("#/parameters/", ComponentKind::Parameter),
            ("#/responses/", ComponentKind::Response),
        ],
        Dialect::V3_0 | Dialect::V3_1 => &[
            ("#/components/schemas/", ComponentKind::Schema),
            ("#/components/parameters/", ComponentKind::Parameter),
            ("#/components/requestBodies/", ComponentKind::RequestBody),
            ("#/components/responses/", ComponentKind::Response),
        ],
    };
    containers
        .iter()
        .find(|(prefix, _)| {
            pointer
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        })
        .map(|(_, kind)| *kind)
}

struct Filters {
    operations: Selector,
    tags: Selector,
    schemas: Selector,
    parameters: Selector,
    request_bodies: Selector,
    responses: Selector,
    deprecated: bool,
}

impl Filters {
    fn new(config: &FiltersConfig) -> AppResult<Self> {
        Ok(Self {
            operations: Selector::new("filters.operations", &config.operations)?,
            tags: Selector::new("filters.tags", &config.tags)?,
            schemas: Selector::new("filters.schemas", &config.schemas)?,
            parameters: Selector::new("filters.parameters", &config.parameters)?,
            request_bodies: Selector::new("filters.requestBodies", &config.request_bodies)?,
            responses: Selector::new("filters.responses", &config.responses)?,
            deprecated: config.deprecated,
        })
    }

    fn component(&self, kind: ComponentKind) -> &Selector {
        match kind {
            ComponentKind::Schema => &self.schemas,
            ComponentKind::Parameter => &self.parameters,
            ComponentKind::RequestBody => &self.request_bodies,
            ComponentKind::Response => &self.responses,
        }
    }

    fn keeps_operation(&self, key: &str, operation: &Value) -> bool {
        if !self.deprecated && is_deprecated(operation) {
            return false;
        }
        let tags: Vec<&str> = operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        self.operations.keeps(key) && self.tags.keeps_any(&tags)
    }
}

fn is_deprecated(node: &Value) -> bool {
    node.get("deprecated").and_then(Value::as_bool) == Some(true)
}

/// What the filter removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filtered {
    /// Operations removed from `paths` and `webhooks`.
    pub operations: usize,
    /// Reusable components removed.
    pub components: usize,
}

/// Applies `config` to `document`.
///
/// # Errors
///
/// `Config` when a `/regex/` entry does not compile.
pub fn filter_document(document: &mut Document, config: &FiltersConfig) -> AppResult<Filtered> {
    if !config.is_active() {
        return Ok(Filtered::default());
    }
    let filters = Filters::new(config)?;
    let dialect = document.dialect();
    let graph = build_graph(document);

    let mut removed = excluded_components(&graph, dialect, &filters);
    let operations = filter_operations(document, &removed, &filters);

    if config.prunes_orphans() {
        let reachable = reachable_components(document.root(), &graph);
        removed.extend(
            graph
                .nodes
                .keys()
                .filter(|pointer| component_kind(dialect, pointer).is_some() && !reachable.contains(*pointer))
                .cloned(),
        );
    }

    let mut components = 0;
    for pointer in &removed {
        if document.remove_component(pointer).is_some() {
            tracing::debug!(component = %pointer, "component filtered out");
            components += 1;
        }
    }
    Ok(Filtered { operations, components })
}

/// Components dropped by their own filter or deprecation, plus everything
/// that depends on one of them.
fn excluded_components(graph: &Graph, dialect: Dialect, filters: &Filters) -> BTreeSet<String> {
    let direct: BTreeSet<&String> = graph
        .nodes
        .iter()
        .filter(|(pointer, node)| {
            component_kind(dialect, pointer).is_some_and(|kind| {
                (!filters.deprecated && node.deprecated) || !filters.component(kind).keeps(&ref_to_name(pointer))
            })
        })
        .map(|(pointer, _)| pointer)
        .collect();

    graph
        .nodes
        .keys()
        .filter(|pointer| {
            direct.contains(pointer)
                || graph
                    .transitive_dependencies
                    .get(*pointer)
                    .is_some_and(|deps| deps.iter().any(|dep| direct.contains(dep)))
        })
        .cloned()
        .collect()
}

/// Removes operations that fail the filters or reference `excluded`.
///
/// Returns the number of removed operations.
fn filter_operations(document: &mut Document, excluded: &BTreeSet<String>, filters: &Filters) -> usize {
    let mut removed = 0;
    for container in ["paths", "webhooks"] {
        let Some(items) = document
            .root_mut()
            .get_mut(container)
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        items.retain(|path, item| {
            let Some(item) = item.as_object_mut() else {
                return true;
            };
            let shared = item.get("parameters").map(references).unwrap_or_default();
            let mut dropped = 0;
            for method in HttpMethod::ALL {
                let key = operation_key(method, path);
                let keep = match item.get(method.as_str()) {
                    Some(operation) => {
                        filters.keeps_operation(&key, operation)
                            && !references(operation)
                                .iter()
                                .chain(&shared)
                                .any(|pointer| excluded.contains(pointer))
                    }
                    None => continue,
                };
                if !keep {
                    tracing::debug!(operation = %key, "operation filtered out");
                    item.shift_remove(method.as_str());
                    dropped += 1;
                }
            }
            removed += dropped;
            dropped == 0
                || item.contains_key("$ref")
                || HttpMethod::ALL.iter().any(|m| item.contains_key(m.as_str()))
        });
    }
    removed
}

/// Components reachable from the remaining `paths` and `webhooks`.
fn reachable_components(root: &Value, graph: &Graph) -> BTreeSet<String> {
    let mut entry_points = BTreeSet::new();
    for container in ["paths", "webhooks"] {
        let Some(items) = root.get(container).and_then(Value::as_object) else {
            continue;
        };
        for item in items.values() {
            entry_points.extend(references(item));
            if let Some(target) = ref_of(item).and_then(|pointer| resolve(root, pointer).ok()) {
                entry_points.extend(references(target));
            }
        }
    }

    let mut reachable = entry_points.clone();
    for pointer in &entry_points {
        if let Some(deps) = graph.transitive_dependencies.get(pointer) {
            reachable.extend(deps.iter().cloned());
        }
    }
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "openapi": "3.1.0",
            "paths": {
                "/pets": {
                    "get": {"responses": {}},
                    "post": {"responses": {}, "deprecated": true}
                },
                "/admin/users": {"get": {"responses": {}}},
                "/admin/stats": {"parameters": [], "delete": {"responses": {}}}
            }
        }))
        .unwrap()
    }

    fn list(include: &[&str], exclude: &[&str]) -> IncludeExclude {
        IncludeExclude {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_exclude_regex_and_empty_items_removed() {
        let mut doc = doc();
        let config = FiltersConfig {
            operations: list(&[], &["/^[A-Z]+ /admin/"]),
            ..FiltersConfig::default()
        };
        assert_eq!(filter_document(&mut doc, &config).unwrap().operations, 2);
        assert_eq!(keys(&doc.root()["paths"]), vec!["/pets"]);
    }

    #[test]
    fn test_include_key_and_deprecated() {
        let mut doc = doc();
        let config = FiltersConfig {
            operations: list(&["GET /pets", "POST /pets"], &[]),
            deprecated: false,
            ..FiltersConfig::default()
        };
        filter_document(&mut doc, &config).unwrap();
        let pets = &doc.root()["paths"]["/pets"];
        assert!(pets.get("get").is_some());
        assert!(pets.get("post").is_none());
        assert_eq!(keys(&doc.root()["paths"]), vec!["/pets"]);
    }

    #[test]
    fn test_inactive_filter_is_noop() {
        let mut doc = doc();
        assert_eq!(
            filter_document(&mut doc, &FiltersConfig::default()).unwrap(),
            Filtered::default()
        );
        assert_eq!(keys(&doc.root()["paths"]).len(), 3);
    }

    #[test]
    fn test_ref_path_items_survive_filtering() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.1.0",
            "paths": {
                "/pets": {"$ref": "#/components/pathItems/Pets"},
                "/other": {"get": {"responses": {}}},
                "/shared": {"parameters": [{"name": "q", "in": "query"}]}
            },
            "webhooks": {"newPet": {"$ref": "#/components/pathItems/Pets"}},
            "components": {
                "pathItems": {"Pets": {"get": {"responses": {"200": {
                    "description": "ok",
                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                }}}}},
                "schemas": {"Pet": {"type": "object"}}
            }
        }))
        .unwrap();
        let config = FiltersConfig {
            operations: list(&[], &["GET /other"]),
            ..FiltersConfig::default()
        };
        let filtered = filter_document(&mut doc, &config).unwrap();

        assert_eq!(filtered, Filtered { operations: 1, components: 0 });
        assert_eq!(keys(&doc.root()["paths"]), vec!["/pets", "/shared"]);
        assert_eq!(keys(&doc.root()["webhooks"]), vec!["newPet"]);
        assert_eq!(doc.schema_names(), vec!["Pet"]);
    }

    #[test]
    fn test_tags_component_filters_and_orphans() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/pets": {
                    "get": {"tags": ["pets"], "responses": {"200": {"description": "ok", "content": {
                        "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                    }}}},
                    "post": {"tags": ["pets"], "requestBody": {"$ref": "#/components/requestBodies/LegacyPet"}, "responses": {}}
                },
                "/store": {"get": {"tags": ["store"], "responses": {"200": {"description": "ok", "content": {
                    "application/json": {"schema": {"$ref": "#/components/schemas/Order"}}
                }}}}}
            },
            "components": {
                "schemas": {
                    "Pet": {"type": "object", "properties": {"tag": {"$ref": "#/components/schemas/Tag"}}},
                    "Tag": {"type": "string"},
                    "Order": {"type": "object"},
                    "Unused": {"type": "integer"}
                },
                "requestBodies": {"LegacyPet": {"content": {
                    "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                }}}
            }
        }))
        .unwrap();
        let config = FiltersConfig {
            tags: list(&["pets"], &[]),
            request_bodies: list(&[], &["LegacyPet"]),
            ..FiltersConfig::default()
        };
        let filtered = filter_document(&mut doc, &config).unwrap();

        assert_eq!(filtered, Filtered { operations: 2, components: 3 });
        assert_eq!(keys(&doc.root()["paths"]), vec!["/pets"]);
        assert_eq!(keys(&doc.root()["paths"]["/pets"]), vec!["get"]);
        assert_eq!(doc.schema_names(), vec!["Pet", "Tag"]);
        assert_eq!(keys(&doc.root()["components"]["requestBodies"]).len(), 0);
    }

    #[test]
    fn test_deprecated_components_take_dependents_along() {
        let mut doc = Document::from_value(json!({
            "swagger": "2.0",
            "paths": {
                "/a": {"get": {"responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/UsesOld"}}}}},
                "/b": {"get": {"responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Free"}}}}}
            },
            "definitions": {
                "Old": {"type": "string", "deprecated": true},
                "UsesOld": {"type": "object", "properties": {"old": {"$ref": "#/definitions/Old"}}},
                "Free": {"type": "string"},
                "Spare": {"type": "string"}
            }
        }))
        .unwrap();
        let config = FiltersConfig {
            deprecated: false,
            orphans: Some(true),
            ..FiltersConfig::default()
        };
        let filtered = filter_document(&mut doc, &config).unwrap();

        assert_eq!(filtered, Filtered { operations: 1, components: 2 });
        assert_eq!(keys(&doc.root()["paths"]), vec!["/b"]);
        assert_eq!(doc.schema_names(), vec!["Free", "Spare"]);
    }

    #[test]
    fn test_schema_include_regex() {
        let mut doc = Document::from_value(json!({
            "openapi": "3.1.0",
            "paths": {},
            "components": {"schemas": {"PetA": {"type": "string"}, "PetB": {"type": "string"}, "Other": {"type": "string"}}}
        }))
        .unwrap();
        let config = FiltersConfig {
            schemas: list(&["/^Pet/"], &["PetB"]),
            orphans: Some(true),
            ..FiltersConfig::default()
        };
        filter_document(&mut doc, &config).unwrap();
        assert_eq!(doc.schema_names(), vec!["PetA"]);
    }
}

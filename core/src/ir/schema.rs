#![deny(missing_docs)]

//! # IR Schema
//!
//! The dialect-independent schema node produced by the schema compiler.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Type tag of an IR schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Homogeneous list.
    Array,
    /// `true` / `false`.
    Boolean,
    /// Closed set of `const` children.
    Enum,
    /// Whole number.
    Integer,
    /// Uninhabited, e.g. `additionalProperties: false`.
    Never,
    /// The `null` literal.
    Null,
    /// Any number.
    Number,
    /// Keyed record.
    Object,
    /// Text.
    String,
    /// Fixed-length positional list.
    Tuple,
    /// Anything.
    Unknown,
    /// No content at all (e.g. a `204` response).
    Void,
}

impl SchemaType {
    /// Maps a dialect type keyword onto an IR type.
    ///
    /// Unrecognised keywords return `None` so the caller can fall back to `unknown`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "array" => SchemaType::Array,
            "boolean" => SchemaType::Boolean,
            "integer" => SchemaType::Integer,
            "null" => SchemaType::Null,
            "number" => SchemaType::Number,
            "object" => SchemaType::Object,
            "string" => SchemaType::String,
            _ => return None,
        })
    }
}

/// How the children in `items` combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    /// Intersection (`allOf`).
    And,
    /// Union (`anyOf`, `oneOf`, enums, multi-type).
    Or,
}

/// Where a schema is observed: responses, requests, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only in read (response) payloads.
    Read,
    /// Only in write (request) payloads.
    Write,
    /// Unrestricted.
    Both,
}

/// A compiled schema node.
///
/// Fields that are unset are skipped when serialised, so the JSON form stays as
/// small as the dialect input that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrSchema {
    /// Reference to a named component.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Type tag. Pure compositions leave it unset.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaType>,
    /// Single dominant scope from `readOnly` / `writeOnly`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_scope: Option<Scope>,
    /// Every scope observed in this subtree.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub access_scopes: BTreeSet<Scope>,
    /// Composition children, array element or tuple slots.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<IrSchema>,
    /// Relationship between `items`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
    /// Declared properties, in document order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, IrSchema>,
    /// Schema of undeclared properties; `never` when they are forbidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<IrSchema>>,
    /// Regex-keyed property schemas.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub pattern_properties: IndexMap<String, IrSchema>,
    /// Constraint on property names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_names: Option<Box<IrSchema>>,
    /// Required property names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Literal value.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Format hint, e.g. `date-time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Regex the value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    /// Exclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Value>,
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    /// Exclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Value>,
    /// Maximum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Minimum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum string length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Minimum string length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Deprecation flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `x-` vendor extensions, copied verbatim.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl IrSchema {
    /// A bare node of the given type.
    pub fn of_type(kind: SchemaType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// A bare `$ref` node.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            reference: Some(pointer.into()),
            ..Self::default()
        }
    }

    /// A composition of `items` under `operator`, with no other fields.
    pub fn composition(items: Vec<IrSchema>, operator: LogicalOperator) -> Self {
        Self {
            items,
            logical_operator: Some(operator),
            ..Self::default()
        }
    }

    /// Whether this node is typed `kind`.
    pub fn is(&self, kind: SchemaType) -> bool {
        self.kind == Some(kind)
    }

    /// Folds another node's observed scopes into this one.
    pub fn merge_scopes(&mut self, other: &BTreeSet<Scope>) {
        self.access_scopes.extend(other.iter().copied());
    }

    /// Attaches composition children.
    ///
    /// * An empty list leaves the node untouched.
    /// * Tuples keep every child as a positional slot.
    /// * Several children get `operator`.
    /// * A single child is merged into the node when `collapse` is set, with the
    ///   child's fields winning. Otherwise it is kept as the only item.
    pub fn add_items(mut self, items: Vec<IrSchema>, operator: LogicalOperator, collapse: bool) -> Self {
        if items.is_empty() {
            return self;
        }
        if self.is(SchemaType::Tuple) {
            self.items = items;
            return self;
        }
        if items.len() > 1 {
            self.items = items;
            self.logical_operator = Some(operator);
            return self;
        }
        if collapse {
            if let Some(only) = items.into_iter().next() {
                return self.overlay(only);
            }
            return self;
        }
        self.items = items;
        self
    }

    /// Spreads `top` over `self`: every field `top` sets replaces the base value.
    pub fn overlay(mut self, top: IrSchema) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if top.$field.is_some() { self.$field = top.$field; } )*
            };
        }
        take!(
            reference, kind, access_scope, logical_operator, additional_properties,
            property_names, const_value, default, example, format, pattern, maximum,
            exclusive_maximum, minimum, exclusive_minimum, max_items, min_items,
            max_length, min_length, deprecated, description, title
        );
        if !top.access_scopes.is_empty() {
            self.access_scopes = top.access_scopes;
        }
        if !top.items.is_empty() {
            self.items = top.items;
        }
        if !top.properties.is_empty() {
            self.properties = top.properties;
        }
        if !top.pattern_properties.is_empty() {
            self.pattern_properties = top.pattern_properties;
        }
        if !top.required.is_empty() {
            self.required = top.required;
        }
        self.extensions.extend(top.extensions);
        self
    }
}

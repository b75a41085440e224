#![deny(missing_docs)]

//! # IR Model
//!
//! The immutable result of compiling one document.

use crate::ir::operation::{HttpMethod, IrBody, IrOperation, IrParameter};
use crate::ir::schema::IrSchema;
use indexmap::IndexMap;
use serde::Serialize;

/// Operations of one path item (or webhook), keyed by method.
pub type IrPathItem = IndexMap<HttpMethod, IrOperation>;

/// Reusable components compiled from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrComponents {
    /// Named schemas.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, IrSchema>,
    /// Named parameters.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, IrParameter>,
    /// Named request bodies.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, IrBody>,
}

/// A server the API is reachable at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrServer {
    /// Base URL, possibly templated.
    pub url: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The whole compiled document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrModel {
    /// Reusable components.
    pub components: IrComponents,
    /// Operations keyed by path template.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, IrPathItem>,
    /// Webhook operations keyed by webhook name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, IrPathItem>,
    /// Servers, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<IrServer>,
}

impl IrModel {
    /// Iterates every path operation, in document order.
    pub fn operations(&self) -> impl Iterator<Item = &IrOperation> {
        self.paths.values().flat_map(|item| item.values())
    }

    /// Finds the operation compiled for `method` on `path`.
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&IrOperation> {
        self.paths.get(path).and_then(|item| item.get(&method))
    }
}

#![deny(missing_docs)]

//! # OpenAPI Front End
//!
//! - **document**: Loaded tree, dialect detection and named-schema ids.
//! - **ref_utils**: JSON Pointer resolution.
//! - **dialects**: V2 / V3.0 / V3.1 adapters behind one trait.
//! - **media**: Media type classification and selection.
//! - **schemas**: Schema compiler.
//! - **routes**: Operation compiler.
//! - **components**: Reusable schemas, parameters and bodies.
//! - **graph**: Dependency graph and access scopes.
//! - **transforms**: Whole-document rewrites run before compilation.

pub mod components;
pub mod dialects;
pub mod document;
pub mod graph;
pub mod media;
pub mod ref_utils;
pub mod routes;
pub mod schemas;
pub mod transforms;

pub use dialects::{adapter_for, DialectAdapter};
pub use document::{Dialect, Document, SchemaId};
pub use graph::{build_graph, Graph, GraphNode};
pub use schemas::{CompileState, SchemaCompiler};

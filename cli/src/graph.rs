#![deny(missing_docs)]

//! # Graph Command
//!
//! Prints the dependency graph of a document: each named node with its access
//! scopes, direct and transitive dependencies.

use crate::error::CliResult;
use crate::input::{read_file, write_json};
use oasir_core::ir::Scope;
use oasir_core::oas::build_graph;
use oasir_core::Document;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Arguments for the graph command.
#[derive(clap::Args, Debug, Clone)]
pub struct GraphArgs {
    /// The OpenAPI / Swagger document to read.
    pub input: PathBuf,

    /// Write the graph here instead of stdout.
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[clap(long)]
    pub pretty: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeReport<'g> {
    scopes: &'g BTreeSet<Scope>,
    dependencies: &'g BTreeSet<String>,
    transitive_dependencies: BTreeSet<&'g str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    deprecated: bool,
}

/// Executes the graph command.
pub fn execute(args: &GraphArgs) -> CliResult<()> {
    let root: Value = read_file(&args.input)?;
    let document = Document::from_value(root)?;
    let graph = build_graph(&document);

    let report: IndexMap<&str, NodeReport<'_>> = graph
        .nodes
        .iter()
        .map(|(pointer, node)| {
            let transitive = graph
                .transitive_dependencies
                .get(pointer)
                .map(|deps| deps.iter().map(String::as_str).collect())
                .unwrap_or_default();
            let report = NodeReport {
                scopes: &node.scopes,
                dependencies: &node.dependencies,
                transitive_dependencies: transitive,
                deprecated: node.deprecated,
            };
            (pointer.as_str(), report)
        })
        .collect();
    write_json(&report, args.output.as_deref(), args.pretty)
}

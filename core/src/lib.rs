#![deny(missing_docs)]

//! # oasir core
//!
//! Compiles OpenAPI documents (Swagger 2.0, OpenAPI 3.0 and 3.1) into one
//! dialect-independent intermediate representation.
//!
//! The pipeline runs in a fixed order over an owned document tree:
//!
//! 1. `filter-spec`: drop operations the configuration does not select.
//! 2. `enum-transform`: promote or inline enums.
//! 3. `build-graph`: compute dependencies and access scopes.
//! 4. `read-write-split`: split schemas into read and write variants.
//! 5. `compile-ir`: compile components, paths and webhooks.

/// Shared error types and diagnostics.
pub mod error;

/// Parser configuration.
pub mod config;

/// Intermediate representation.
pub mod ir;

/// Phase timing.
pub mod logger;

/// OpenAPI (OAS) front end.
pub mod oas;

/// Package metadata lookup.
pub mod packages;

/// Pointer lookups over a compiled document.
pub mod resolver;

pub use config::ParserConfig;
pub use error::{AppError, AppResult, Diagnostic, DiagnosticKind};
pub use ir::IrModel;
pub use logger::{Logger, PhaseTiming};
pub use oas::{Dialect, Document};
pub use packages::{PackageLookup, StaticPackages};
pub use resolver::{IrNode, ResolverHandle};

use oas::components::compile_components;
use oas::dialects::adapter_for;
use oas::graph::build_graph;
use oas::routes::builder::OperationCompiler;
use oas::routes::compile_routes;
use oas::schemas::CompileState;
use oas::transforms::{enums, filter, read_write, required};
use serde_json::Value;

/// The result of compiling one document.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    /// The document tree after every transform.
    pub document: Value,
    /// The compiled model.
    pub ir: IrModel,
    /// Problems recovered from during compilation.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledDocument {
    /// A pointer resolver over the transformed tree and its IR.
    pub fn resolver(&self) -> ResolverHandle<'_> {
        ResolverHandle::new(&self.document, &self.ir)
    }
}

/// Runs the whole-document transforms in place.
///
/// # Errors
///
/// `Config` when the configuration is invalid.
pub fn transform_document(document: &mut Document, config: &ParserConfig, logger: &mut Logger) -> AppResult<()> {
    config.validate()?;
    let transforms = &config.transforms;

    let token = logger.begin("filter-spec");
    let filtered = filter::filter_document(document, &config.filters);
    logger.end(token);
    let filtered = filtered?;
    if filtered != filter::Filtered::default() {
        tracing::info!(
            operations = filtered.operations,
            components = filtered.components,
            "filtered document"
        );
    }

    let token = logger.begin("enum-transform");
    enums::enums_transform(document, &transforms.enums);
    logger.end(token);

    if transforms.properties_required_by_default {
        let token = logger.begin("properties-required-by-default");
        required::require_all_properties(document);
        logger.end(token);
    }

    if transforms.read_write.enabled {
        let token = logger.begin("build-graph");
        let graph = build_graph(document);
        logger.end(token);

        let token = logger.begin("read-write-split");
        read_write::read_write_transform(document, &transforms.read_write, &graph, logger);
        logger.end(token);
    }
    Ok(())
}

/// Compiles a parsed document tree with a throwaway logger.
pub fn compile_document(root: Value, config: &ParserConfig) -> AppResult<CompiledDocument> {
    let mut logger = Logger::new();
    compile_with_logger(root, config, &mut logger)
}

/// Compiles a parsed document tree, recording phase timings in `logger`.
///
/// # Errors
///
/// * `UnsupportedDocument` / `InvalidDocument` for trees that are not a known dialect.
/// * `UnresolvedReference` for a `$ref` whose target does not exist.
/// * `RecursionLimit` when nesting exceeds `config.max_depth`.
/// * `Config` for an invalid configuration.
pub fn compile_with_logger(root: Value, config: &ParserConfig, logger: &mut Logger) -> AppResult<CompiledDocument> {
    let mut document = Document::from_value(root)?;
    transform_document(&mut document, config, logger)?;

    let token = logger.begin("compile-ir");
    let compiled = compile_ir(document.root(), document.dialect(), config);
    logger.end(token);
    let (ir, diagnostics) = compiled?;

    tracing::info!(
        operations = ir.operations().count(),
        schemas = ir.components.schemas.len(),
        diagnostics = diagnostics.len(),
        "document compiled"
    );
    Ok(CompiledDocument {
        document: document.into_value(),
        ir,
        diagnostics,
    })
}

fn compile_ir(root: &Value, dialect: Dialect, config: &ParserConfig) -> AppResult<(IrModel, Vec<Diagnostic>)> {
    let adapter = adapter_for(dialect);
    let matcher = config.pagination.matcher()?;
    let compiler = OperationCompiler::new(root, adapter, matcher.as_ref(), config.max_depth);
    let mut state = CompileState::new();

    let components = compile_components(&compiler, &mut state)?;
    let routes = compile_routes(&compiler, &mut state)?;
    let ir = IrModel {
        components,
        paths: routes.paths,
        webhooks: routes.webhooks,
        servers: adapter.servers(root),
    };
    Ok((ir, state.take_diagnostics()))
}

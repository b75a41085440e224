#![deny(missing_docs)]

//! # Resolver Handle
//!
//! Lets emitters look up named parts of a compiled document by pointer, either
//! in the transformed source tree or in the IR components.

use crate::error::{AppError, AppResult};
use crate::ir::{IrBody, IrModel, IrParameter, IrSchema};
use crate::oas::ref_utils::{self, pointer_to_path};
use serde_json::Value;

/// A compiled component found by [`ResolverHandle::resolve_ir_ref`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IrNode<'m> {
    /// A named schema.
    Schema(&'m IrSchema),
    /// A named parameter.
    Parameter(&'m IrParameter),
    /// A named request body.
    RequestBody(&'m IrBody),
}

/// Borrowed view over a compiled document.
#[derive(Debug, Clone, Copy)]
pub struct ResolverHandle<'d> {
    document: &'d Value,
    ir: &'d IrModel,
}

impl<'d> ResolverHandle<'d> {
    /// Binds a transformed tree to the IR compiled from it.
    pub fn new(document: &'d Value, ir: &'d IrModel) -> Self {
        Self { document, ir }
    }

    /// Resolves `pointer` against the transformed document tree.
    pub fn resolve_ref(&self, pointer: &str) -> AppResult<&'d Value> {
        ref_utils::resolve(self.document, pointer)
    }

    /// Resolves a component pointer to its compiled IR node.
    ///
    /// # Errors
    ///
    /// `UnresolvedReference` for pointers that do not name a compiled
    /// schema, parameter or request body.
    pub fn resolve_ir_ref(&self, pointer: &str) -> AppResult<IrNode<'d>> {
        let components = &self.ir.components;
        let path = pointer_to_path(pointer);
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        let found = match segments.as_slice() {
            ["components", "schemas", name] | ["definitions", name] => {
                components.schemas.get(*name).map(IrNode::Schema)
            }
            ["components", "parameters", name] | ["parameters", name] => {
                components.parameters.get(*name).map(IrNode::Parameter)
            }
            ["components", "requestBodies", name] => {
                components.request_bodies.get(*name).map(IrNode::RequestBody)
            }
            _ => None,
        };
        found.ok_or_else(|| AppError::unresolved(pointer))
    }
}

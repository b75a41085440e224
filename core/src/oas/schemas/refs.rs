#![deny(missing_docs)]

//! # References
//!
//! A `$ref` to a named component stays a reference in the IR. A `$ref` into the
//! middle of the document is inlined, unless the pointer is already being
//! expanded, in which case the reference is kept to break the cycle.

use crate::error::AppResult;
use crate::ir::{IrSchema, LogicalOperator, SchemaType, Scope};
use crate::oas::ref_utils::{is_top_level_component, resolve};
use crate::oas::schemas::{CompileState, SchemaCompiler};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

impl<'a> SchemaCompiler<'a> {
    /// Compiles a `$ref` node.
    ///
    /// # Errors
    ///
    /// `UnresolvedReference` when the target does not exist, even if the
    /// reference itself is kept.
    pub(crate) fn compile_ref(&self, map: &Map<String, Value>, pointer: &str, state: &mut CompileState) -> AppResult<IrSchema> {
        let target = resolve(self.root, pointer)?;

        if !is_top_level_component(pointer) && !state.tracker.contains(pointer) {
            return self.expand(pointer, target, state);
        }

        let mut node = IrSchema::reference(pointer);
        node.access_scopes = self.target_scopes(pointer, target, state)?;

        let mut ir = self.init(map);
        self.apply_meta(map, &mut ir);
        let own_scopes = ir.access_scopes.clone();

        let mut items = vec![node];
        if self.adapter.schema_types(map).iter().any(|t| t == "null") {
            items.push(IrSchema::of_type(SchemaType::Null));
        }
        let mut ir = ir.add_items(items, LogicalOperator::Or, true);
        ir.merge_scopes(&own_scopes);
        let item_scopes: Vec<Scope> = ir
            .items
            .iter()
            .flat_map(|item| item.access_scopes.iter().copied())
            .collect();
        ir.access_scopes.extend(item_scopes);
        Ok(ir)
    }

    /// Compiles the node at `pointer` with `pointer` marked as on the path.
    pub(crate) fn expand(&self, pointer: &str, target: &Value, state: &mut CompileState) -> AppResult<IrSchema> {
        state.tracker.insert(pointer.to_string());
        let saved_ref = state.current_ref.replace(pointer.to_string());
        let saved_all_of = std::mem::take(&mut state.in_all_of);

        let result = self.compile(target, state);

        state.in_all_of = saved_all_of;
        state.current_ref = saved_ref;
        state.tracker.remove(pointer);
        result
    }

    /// Access scopes observed under a named schema.
    ///
    /// Only named schemas carry scopes. A pointer already on the path
    /// contributes nothing.
    fn target_scopes(&self, pointer: &str, target: &Value, state: &mut CompileState) -> AppResult<BTreeSet<Scope>> {
        if state.tracker.contains(pointer) {
            return Ok(BTreeSet::new());
        }
        if !pointer.starts_with(self.adapter.dialect().schemas_pointer_prefix()) {
            return Ok(BTreeSet::new());
        }
        if let Some(cached) = state.cached_scopes(pointer) {
            return Ok(cached.clone());
        }
        let compiled = self.expand(pointer, target, state)?;
        state.cache_scopes(pointer, compiled.access_scopes.clone());
        Ok(compiled.access_scopes)
    }
}

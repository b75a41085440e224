#![deny(missing_docs)]

//! # Intermediate Representation
//!
//! - **schema**: compiled schema nodes.
//! - **operation**: operations, parameters, bodies and responses.
//! - **model**: the document-level container handed to emitters.

pub mod model;
pub mod operation;
pub mod schema;

pub use model::{IrComponents, IrModel, IrPathItem, IrServer};
pub use operation::{
    operation_key, BodyPagination, HttpMethod, IrBody, IrOperation, IrParameter, IrParameters,
    IrResponse, MediaKind, ParameterLocation,
};
pub use schema::{IrSchema, LogicalOperator, SchemaType, Scope};

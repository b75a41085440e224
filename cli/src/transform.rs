#![deny(missing_docs)]

//! # Transform Command
//!
//! Runs only the document transforms (filter, enums, read/write split) and
//! prints the rewritten document.

use crate::error::CliResult;
use crate::input::{load_config, read_file, write_json, InputArgs};
use oasir_core::{transform_document, Document, Logger};
use serde_json::Value;

/// Arguments for the transform command.
#[derive(clap::Args, Debug, Clone)]
pub struct TransformArgs {
    /// Document, config and output flags.
    #[clap(flatten)]
    pub input: InputArgs,
}

/// Executes the transform command.
pub fn execute(args: &TransformArgs) -> CliResult<()> {
    let config = load_config(args.input.config.as_deref())?;
    let root: Value = read_file(&args.input.input)?;

    let mut document = Document::from_value(root)?;
    let mut logger = Logger::new();
    transform_document(&mut document, &config, &mut logger)?;

    write_json(&document.into_value(), args.input.output.as_deref(), args.input.pretty)
}

#![deny(missing_docs)]

//! # oasir CLI
//!
//! Command line front end for the OpenAPI compiler.
//!
//! Supported Commands:
//! - `compile`: Document -> transforms -> IR model (JSON).
//! - `transform`: Document -> transforms -> rewritten document.
//! - `graph`: Dependency graph of the named components.

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod compile;
mod error;
mod graph;
mod input;
mod logging;
mod transform;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI to IR compiler")]
struct Cli {
    /// Log level when `RUST_LOG` is unset (error, warn, info, debug, trace).
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a document into the intermediate representation.
    Compile(compile::CompileArgs),
    /// Apply the configured transforms and print the rewritten document.
    Transform(transform::TransformArgs),
    /// Print the component dependency graph.
    Graph(graph::GraphArgs),
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match &cli.command {
        Commands::Compile(args) => compile::execute(args)?,
        Commands::Transform(args) => transform::execute(args)?,
        Commands::Graph(args) => graph::execute(args)?,
    }

    Ok(())
}

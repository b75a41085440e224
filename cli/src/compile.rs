#![deny(missing_docs)]

//! # Compile Command
//!
//! Runs the whole pipeline and prints the IR model with its diagnostics.

use crate::error::CliResult;
use crate::input::{load_config, read_file, write_json, InputArgs};
use oasir_core::{compile_with_logger, Diagnostic, IrModel, Logger, PackageLookup, PhaseTiming, StaticPackages};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Arguments for the compile command.
#[derive(clap::Args, Debug, Clone)]
pub struct CompileArgs {
    /// Document, config and output flags.
    #[clap(flatten)]
    pub input: InputArgs,

    /// Include phase timings in the output.
    #[clap(long)]
    pub timings: bool,

    /// Installed package available to emitters, as `name@version`. Repeatable.
    #[clap(long = "package", value_parser = parse_package)]
    pub packages: Vec<(String, String)>,
}

fn parse_package(s: &str) -> Result<(String, String), String> {
    StaticPackages::parse_spec(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct CompileOutput<'a> {
    ir: &'a IrModel,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    packages: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timings: Option<&'a [PhaseTiming]>,
}

/// Executes the compile command.
pub fn execute(args: &CompileArgs) -> CliResult<()> {
    let config = load_config(args.input.config.as_deref())?;
    let root: Value = read_file(&args.input.input)?;

    let packages = StaticPackages::new(args.packages.iter().cloned());
    let installed: BTreeMap<String, String> = args
        .packages
        .iter()
        .filter_map(|(name, _)| packages.get_version(name).map(|v| (name.clone(), v)))
        .collect();

    let mut logger = Logger::new();
    let compiled = compile_with_logger(root, &config, &mut logger)?;
    for diagnostic in &compiled.diagnostics {
        eprintln!("warning: {} ({})", diagnostic.message, diagnostic.location);
    }

    let output = CompileOutput {
        ir: &compiled.ir,
        diagnostics: &compiled.diagnostics,
        packages: installed,
        timings: args.timings.then(|| logger.timings()),
    };
    write_json(&output, args.input.output.as_deref(), args.input.pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn args(input: PathBuf, output: PathBuf) -> CompileArgs {
        CompileArgs {
            input: InputArgs {
                input,
                config: None,
                output: Some(output),
                pretty: true,
            },
            timings: true,
            packages: vec![("zod".into(), "3.22.4".into())],
        }
    }

    #[test]
    fn test_compile_writes_ir_and_timings() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("api.yaml");
        fs::write(
            &input,
            r#"
openapi: 3.0.3
info: {title: Pets, version: "1"}
paths:
  /pets:
    get:
      operationId: listPets
      responses: {"204": {description: empty}}
"#,
        )
        .unwrap();
        let output = dir.path().join("ir.json");
        execute(&args(input, output.clone())).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["ir"]["paths"]["/pets"]["get"]["id"], "listPets");
        assert_eq!(written["packages"]["zod"], "3.22.4");
        let phases: Vec<&str> = written["timings"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(phases.last(), Some(&"compile-ir"));
    }

    #[test]
    fn test_package_flag_format() {
        assert_eq!(parse_package("@scope/pkg@1.0.0").unwrap(), ("@scope/pkg".into(), "1.0.0".into()));
        assert!(parse_package("nover").is_err());
    }
}

#![deny(missing_docs)]

//! # Input and Output
//!
//! Reads documents and configuration files, and writes JSON results.
//!
//! Files ending in `.yaml` / `.yml` are parsed as YAML, everything else as JSON.

use crate::error::CliResult;
use oasir_core::ParserConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Shared flags of commands that read a document and a configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// The OpenAPI / Swagger document to read.
    pub input: PathBuf,

    /// Parser configuration file (JSON or YAML).
    #[clap(long, env = "OASIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the result here instead of stdout.
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[clap(long)]
    pub pretty: bool,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Reads and deserializes `path`, choosing the format from its extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = fs::read_to_string(path)?;
    if is_yaml(path) {
        Ok(serde_yaml::from_str(&text)?)
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

/// Loads the configuration at `path`, or the defaults when there is none.
pub fn load_config(path: Option<&Path>) -> CliResult<ParserConfig> {
    let Some(path) = path else {
        return Ok(ParserConfig::default());
    };
    let config: ParserConfig = read_file(path)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Serializes `value` as JSON to `output`, or to stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> CliResult<()> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    match output {
        Some(path) => {
            fs::write(path, text)?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use oasir_core::config::EnumsMode;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("api.yml");
        fs::write(&yaml, "openapi: 3.1.0\npaths: {}\n").unwrap();
        let json_path = dir.path().join("api.json");
        fs::write(&json_path, r#"{"openapi": "3.1.0", "paths": {}}"#).unwrap();

        let a: Value = read_file(&yaml).unwrap();
        let b: Value = read_file(&json_path).unwrap();
        assert_eq!(a, b);

        // other extensions are read as JSON
        let wrong = dir.path().join("api.txt");
        fs::write(&wrong, "openapi: 3.1.0\n").unwrap();
        assert!(matches!(read_file::<Value>(&wrong), Err(CliError::Json(_))));
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oasir.yaml");
        fs::write(&path, "transforms:\n  enums:\n    mode: root\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.transforms.enums.mode, EnumsMode::Root);
        assert_eq!(load_config(None).unwrap(), ParserConfig::default());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"maxDepth": 0}"#).unwrap();
        assert!(matches!(load_config(Some(&bad)), Err(CliError::Core(_))));
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&json!({"a": 1}), Some(&path), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}\n");
    }
}

#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use oasir_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Failure inside the compiler.
    #[display("{}", _0)]
    Core(AppError),

    /// Input or config file that is not valid JSON.
    #[display("JSON Error: {}", _0)]
    Json(serde_json::Error),

    /// Input or config file that is not valid YAML.
    #[display("YAML Error: {}", _0)]
    Yaml(serde_yaml::Error),
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Core(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Yaml(e) => Some(e),
        }
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;

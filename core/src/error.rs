#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace, plus the
//! non-fatal `Diagnostic` record collected while compiling.

use derive_more::{Display, From};
use serde::Serialize;

/// The Global Error Enum.
///
/// Every fatal condition carries the pointer or operation key it was raised at.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A `$ref` (or an explicit lookup) named a pointer that does not exist.
    #[from(ignore)]
    #[display("Unresolved reference: {pointer}")]
    UnresolvedReference {
        /// The pointer that failed to resolve.
        pointer: String,
    },

    /// Recursion went deeper than the configured ceiling.
    #[from(ignore)]
    #[display("Recursion limit of {limit} exceeded at {pointer}")]
    RecursionLimit {
        /// Location where the ceiling was hit.
        pointer: String,
        /// The configured ceiling.
        limit: usize,
    },

    /// The document is not a recognised V2 / V3.0 / V3.1 description.
    #[from(ignore)]
    #[display("Unsupported document: {_0}")]
    UnsupportedDocument(String),

    /// The document is recognised but structurally unusable.
    #[from(ignore)]
    #[display("Invalid document: {_0}")]
    InvalidDocument(String),

    /// The parser configuration cannot be honoured.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// Wrapper for JSON errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for [`AppError::UnresolvedReference`].
    pub fn unresolved(pointer: impl Into<String>) -> Self {
        AppError::UnresolvedReference {
            pointer: pointer.into(),
        }
    }
}

/// Category of a recovered, non-fatal problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Two operations declared the same native id.
    DuplicateOperationId,
    /// An enum literal of a kind the compiler does not model was skipped.
    UnsupportedEnumValue,
    /// A schema had no type, properties or composition keyword.
    UnknownSchema,
    /// Content was declared only in media types the compiler skips.
    UnsupportedMediaType,
    /// A security requirement named a scheme that is not declared.
    UnresolvedSecurityScheme,
}

/// A recovered problem, reported alongside the compiled IR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Pointer or operation key the problem was found at.
    pub location: String,
    /// Human readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Builds a diagnostic and mirrors it to the tracing subscriber.
    pub fn new(kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            location: location.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = ?diagnostic.kind,
            location = %diagnostic.location,
            "{}",
            diagnostic.message
        );
        diagnostic
    }
}

#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving operation ids from native `operationId`s or
//! from the method and path.

use crate::config::StringCase;
use crate::ir::HttpMethod;
use crate::oas::transforms::naming::to_case;
use regex::Regex;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^}]*)}").expect("Invalid regex constant"))
}

/// Converts a native `operationId` into a camelCase identifier.
///
/// A leading digit gets a `_` prefix. Returns `None` when nothing
/// identifier-like is left.
pub fn sanitize_operation_id(native: &str) -> Option<String> {
    let id = to_case(native, StringCase::CamelCase);
    match id.chars().next() {
        None => None,
        Some(first) if first.is_ascii_digit() => Some(format!("_{id}")),
        Some(_) => Some(id),
    }
}

/// Derives an id from the method and path when `operationId` is missing.
///
/// e.g. `GET /users/{id}` -> `getUsersById`
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let with_by = placeholder().replace_all(path, "by-$1");
    let flat = with_by.replace(['/', ':', '+'], "-");
    to_case(&format!("{}-{}", method.as_str(), flat), StringCase::CamelCase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_operation_id() {
        assert_eq!(sanitize_operation_id("list-pets").as_deref(), Some("listPets"));
        assert_eq!(sanitize_operation_id("Pets.Create").as_deref(), Some("petsCreate"));
        assert_eq!(sanitize_operation_id("getHTTPStatus").as_deref(), Some("getHttpStatus"));
        assert_eq!(sanitize_operation_id("2fa-verify").as_deref(), Some("_2faVerify"));
        assert_eq!(sanitize_operation_id("--"), None);
    }

    #[test]
    fn test_synthesize_operation_id() {
        assert_eq!(synthesize_operation_id(HttpMethod::Get, "/users"), "getUsers");
        assert_eq!(
            synthesize_operation_id(HttpMethod::Get, "/users/{id}"),
            "getUsersById"
        );
        assert_eq!(
            synthesize_operation_id(HttpMethod::Post, "/users/{userId}/activate"),
            "postUsersByUserIdActivate"
        );
    }
}

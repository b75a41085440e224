#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Case conversion, `{{name}}` template expansion and collision-free component names.

use crate::config::{NamingConfig, StringCase};
use std::collections::HashSet;

/// Splits an identifier into words.
///
/// Boundaries are non-alphanumeric characters, a lower-case letter or digit
/// followed by an upper-case letter, and the last capital of an acronym that
/// starts a new word (`HTTPServer` → `HTTP`, `Server`).
pub fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Converts `input` to `case`.
pub fn to_case(input: &str, case: StringCase) -> String {
    let words = split_words(input);
    match case {
        StringCase::Preserve => input.to_string(),
        StringCase::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
        StringCase::CamelCase => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect(),
        StringCase::SnakeCase => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        StringCase::ScreamingSnakeCase => words
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
    }
}

/// Expands a `{{name}}` template and applies its case.
pub fn apply_naming(name: &str, naming: &NamingConfig) -> String {
    let expanded = naming.name.replace("{{name}}", name);
    to_case(&expanded, naming.case)
}

/// `base`, or `base` followed by the smallest integer (from 2) not in `existing`.
pub fn unique_component_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("user_id-value"), vec!["user", "id", "value"]);
        assert_eq!(split_words("petV2Status"), vec!["pet", "V2", "Status"]);
    }

    #[test]
    fn test_cases() {
        assert_eq!(to_case("list-pets", StringCase::CamelCase), "listPets");
        assert_eq!(to_case("pet status", StringCase::PascalCase), "PetStatus");
        assert_eq!(to_case("PetStatus", StringCase::SnakeCase), "pet_status");
        assert_eq!(to_case("PetStatus", StringCase::ScreamingSnakeCase), "PET_STATUS");
        assert_eq!(to_case("Pet-Status", StringCase::Preserve), "Pet-Status");
    }

    #[test]
    fn test_apply_naming() {
        let naming = NamingConfig::new("{{name}}Writable", StringCase::Preserve);
        assert_eq!(apply_naming("Pet", &naming), "PetWritable");
        let enums = NamingConfig::new("{{name}}Enum", StringCase::PascalCase);
        assert_eq!(apply_naming("status", &enums), "StatusEnum");
    }

    #[test]
    fn test_unique_component_name() {
        let existing: HashSet<String> = ["Pet", "Pet2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_component_name("Pet", &existing), "Pet3");
        assert_eq!(unique_component_name("Dog", &existing), "Dog");
    }
}

#![deny(missing_docs)]

//! # Package Metadata
//!
//! Lookup of installed package versions for dialect-specific feature gating.
//! The compiler itself never consults it; emitters and the CLI do.

use crate::error::{AppError, AppResult};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Answers questions about the packages available to the generated code.
pub trait PackageLookup {
    /// Whether `name` is installed at all.
    fn is_installed(&self, name: &str) -> bool;

    /// The installed version of `name`, if any.
    fn get_version(&self, name: &str) -> Option<String>;

    /// Whether the installed version of `name` satisfies `range`.
    ///
    /// Returns `Ok(false)` when the package is missing.
    fn satisfies(&self, name: &str, range: &str) -> AppResult<bool>;
}

/// In-memory package table.
#[derive(Debug, Clone, Default)]
pub struct StaticPackages {
    versions: HashMap<String, String>,
}

impl StaticPackages {
    /// Builds the table from `(name, version)` pairs.
    pub fn new<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            versions: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a `name@version` spec, as passed on the command line.
    ///
    /// Scoped names (`@scope/pkg@1.0.0`) split on the last `@`.
    pub fn parse_spec(spec: &str) -> AppResult<(String, String)> {
        match spec.rfind('@') {
            Some(idx) if idx > 0 && idx + 1 < spec.len() => {
                Ok((spec[..idx].to_string(), spec[idx + 1..].to_string()))
            }
            _ => Err(AppError::Config(format!(
                "package `{spec}` must be written as name@version"
            ))),
        }
    }
}

impl PackageLookup for StaticPackages {
    fn is_installed(&self, name: &str) -> bool {
        self.versions.contains_key(name)
    }

    fn get_version(&self, name: &str) -> Option<String> {
        self.versions.get(name).cloned()
    }

    fn satisfies(&self, name: &str, range: &str) -> AppResult<bool> {
        let Some(installed) = self.versions.get(name) else {
            return Ok(false);
        };
        let version = Version::parse(installed)?;
        for comparator in range.split_whitespace() {
            if !matches_comparator(&version, comparator)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Missing minor/patch components read as zero; pre-release tags are ignored.
    fn parse(text: &str) -> AppResult<Self> {
        let re = version_regex()?;
        let caps = re
            .captures(text.trim())
            .ok_or_else(|| AppError::Config(format!("invalid version `{text}`")))?;
        let part = |i: usize| -> u64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        Ok(Self {
            major: part(1),
            minor: part(2),
            patch: part(3),
        })
    }
}

fn version_regex() -> AppResult<Regex> {
    Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-+].*)?$")
        .map_err(|e| AppError::General(e.to_string()))
}

fn matches_comparator(version: &Version, comparator: &str) -> AppResult<bool> {
    if comparator == "*" || comparator.is_empty() {
        return Ok(true);
    }
    let (op, rest) = split_operator(comparator);
    let target = Version::parse(rest)?;
    let ord = version.cmp(&target);
    Ok(match op {
        ">=" => ord != Ordering::Less,
        ">" => ord == Ordering::Greater,
        "<=" => ord != Ordering::Greater,
        "<" => ord == Ordering::Less,
        "^" => {
            let upper = if target.major > 0 {
                Version { major: target.major + 1, minor: 0, patch: 0 }
            } else if target.minor > 0 {
                Version { major: 0, minor: target.minor + 1, patch: 0 }
            } else {
                Version { major: 0, minor: 0, patch: target.patch + 1 }
            };
            ord != Ordering::Less && *version < upper
        }
        "~" => {
            let upper = Version { major: target.major, minor: target.minor + 1, patch: 0 };
            ord != Ordering::Less && *version < upper
        }
        _ => ord == Ordering::Equal,
    })
}

fn split_operator(comparator: &str) -> (&str, &str) {
    for op in [">=", "<=", ">", "<", "^", "~", "="] {
        if let Some(rest) = comparator.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("=", comparator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StaticPackages {
        StaticPackages::new([("zod", "3.22.4"), ("@tanstack/react-query", "5.0.0"), ("legacy", "0.2.3")])
    }

    #[test]
    fn test_lookup() {
        let pkgs = table();
        assert!(pkgs.is_installed("zod"));
        assert!(!pkgs.is_installed("valibot"));
        assert_eq!(pkgs.get_version("zod").as_deref(), Some("3.22.4"));
    }

    #[test]
    fn test_caret_and_tilde() {
        let pkgs = table();
        assert!(pkgs.satisfies("zod", "^3.0.0").unwrap());
        assert!(!pkgs.satisfies("zod", "^4").unwrap());
        assert!(pkgs.satisfies("zod", "~3.22.0").unwrap());
        assert!(!pkgs.satisfies("zod", "~3.21.0").unwrap());
        assert!(pkgs.satisfies("legacy", "^0.2.1").unwrap());
        assert!(!pkgs.satisfies("legacy", "^0.3.0").unwrap());
    }

    #[test]
    fn test_compound_range() {
        let pkgs = table();
        assert!(pkgs.satisfies("@tanstack/react-query", ">=5 <6").unwrap());
        assert!(!pkgs.satisfies("@tanstack/react-query", ">5.0.0").unwrap());
        assert!(pkgs.satisfies("zod", "*").unwrap());
        assert!(pkgs.satisfies("zod", "3.22.4").unwrap());
    }

    #[test]
    fn test_missing_package_never_satisfies() {
        assert!(!table().satisfies("valibot", "*").unwrap());
    }

    #[test]
    fn test_parse_spec() {
        assert_eq!(
            StaticPackages::parse_spec("@hey/pkg@1.2.3").unwrap(),
            ("@hey/pkg".to_string(), "1.2.3".to_string())
        );
        assert!(StaticPackages::parse_spec("zod").is_err());
        assert!(StaticPackages::parse_spec("zod@").is_err());
    }

    #[test]
    fn test_invalid_version_is_config_error() {
        let pkgs = StaticPackages::new([("odd", "latest")]);
        assert!(matches!(pkgs.satisfies("odd", "^1"), Err(AppError::Config(_))));
    }
}

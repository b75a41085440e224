#![deny(missing_docs)]

//! # Parser Configuration
//!
//! The resolved configuration handed to the compiler. Every struct deserializes
//! over its defaults, so a partial JSON/YAML file only needs the keys it changes.

use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default words that mark a parameter or property as a pagination control.
pub const DEFAULT_PAGINATION_KEYWORDS: [&str; 6] =
    ["after", "before", "cursor", "offset", "page", "start"];

/// Default recursion ceiling for schema compilation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Top-level parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Whole-document rewrites applied before compilation.
    pub transforms: TransformsConfig,
    /// Pagination keyword detection.
    pub pagination: PaginationConfig,
    /// Operation inclusion/exclusion.
    pub filters: FiltersConfig,
    /// Recursion ceiling for schema compilation.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            transforms: TransformsConfig::default(),
            pagination: PaginationConfig::default(),
            filters: FiltersConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration of the document transforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformsConfig {
    /// Enum promotion / inlining.
    pub enums: EnumsConfig,
    /// Read/write schema splitting.
    pub read_write: ReadWriteConfig,
    /// Mark every property required when an object omits `required`.
    pub properties_required_by_default: bool,
}

/// Mode of the enum transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumsMode {
    /// Leave enums where they are.
    #[default]
    Off,
    /// Copy top-level enums into every referencing site.
    Inline,
    /// Promote inline enums to named top-level schemas.
    Root,
}

/// Casing applied after a naming template is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringCase {
    /// `PascalCase`
    #[serde(rename = "PascalCase")]
    PascalCase,
    /// `camelCase`
    #[serde(rename = "camelCase")]
    CamelCase,
    /// `snake_case`
    #[serde(rename = "snake_case")]
    SnakeCase,
    /// `SCREAMING_SNAKE_CASE`
    #[serde(rename = "SCREAMING_SNAKE_CASE")]
    ScreamingSnakeCase,
    /// Keep the expanded template as-is.
    #[default]
    #[serde(rename = "preserve")]
    Preserve,
}

/// A `{{name}}` template plus the case applied to its expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NamingConfig {
    /// Template containing the `{{name}}` placeholder.
    pub name: String,
    /// Case applied to the expanded template.
    pub case: StringCase,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self::new("{{name}}", StringCase::Preserve)
    }
}

impl NamingConfig {
    /// Convenience constructor.
    pub fn new(name: &str, case: StringCase) -> Self {
        Self {
            name: name.to_string(),
            case,
        }
    }

    fn validate(&self, field: &str) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Config(format!("{field}: naming template is empty")));
        }
        if !self.name.contains("{{name}}") {
            return Err(AppError::Config(format!(
                "{field}: naming template `{}` lacks the {{{{name}}}} placeholder",
                self.name
            )));
        }
        Ok(())
    }
}

/// Enum transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumsConfig {
    /// Transform mode.
    pub mode: EnumsMode,
    /// Template for promoted enum names.
    pub name: String,
    /// Case applied to promoted enum names.
    pub case: StringCase,
}

impl Default for EnumsConfig {
    fn default() -> Self {
        Self {
            mode: EnumsMode::Off,
            name: "{{name}}Enum".to_string(),
            case: StringCase::PascalCase,
        }
    }
}

impl EnumsConfig {
    /// The template/case pair used to name promoted enums.
    pub fn naming(&self) -> NamingConfig {
        NamingConfig::new(&self.name, self.case)
    }
}

/// Read/write split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadWriteConfig {
    /// Whether the split runs at all.
    pub enabled: bool,
    /// Naming of the write (request) variant.
    pub requests: NamingConfig,
    /// Naming of the read (response) variant.
    pub responses: NamingConfig,
}

impl Default for ReadWriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: NamingConfig::new("{{name}}Writable", StringCase::Preserve),
            responses: NamingConfig::new("{{name}}", StringCase::Preserve),
        }
    }
}

/// Pagination keyword settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Names that mark a pagination control. Matched as whole words.
    pub keywords: Vec<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_PAGINATION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl PaginationConfig {
    /// Compiles the keyword list into one anchored alternation.
    ///
    /// Returns `None` when there are no keywords.
    pub fn matcher(&self) -> AppResult<Option<Regex>> {
        if self.keywords.is_empty() {
            return Ok(None);
        }
        let alternation = self
            .keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("^({alternation})$"))
            .map(Some)
            .map_err(|e| AppError::Config(format!("pagination.keywords: {e}")))
    }
}

/// Filter settings. Every list holds names, or `/regex/` patterns.
///
/// Operations are named by key (`"GET /pets"`) and components by their own
/// name. An operation or component that references an excluded component is
/// excluded as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FiltersConfig {
    /// Operation keys.
    pub operations: IncludeExclude,
    /// Operation tags. An operation without tags fails a non-empty `include`.
    pub tags: IncludeExclude,
    /// Named schemas.
    pub schemas: IncludeExclude,
    /// Reusable parameters.
    pub parameters: IncludeExclude,
    /// Reusable request bodies.
    pub request_bodies: IncludeExclude,
    /// Reusable responses.
    pub responses: IncludeExclude,
    /// Keep deprecated operations and components.
    pub deprecated: bool,
    /// Keep components that no remaining operation references.
    ///
    /// Unset keeps them unless another filter is active. `false` prunes them
    /// on its own.
    pub orphans: Option<bool>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            operations: IncludeExclude::default(),
            tags: IncludeExclude::default(),
            schemas: IncludeExclude::default(),
            parameters: IncludeExclude::default(),
            request_bodies: IncludeExclude::default(),
            responses: IncludeExclude::default(),
            deprecated: true,
            orphans: None,
        }
    }
}

impl FiltersConfig {
    /// Whether any filter would remove something.
    pub fn is_active(&self) -> bool {
        self.lists().iter().any(|(_, list)| !list.is_empty()) || !self.deprecated || self.orphans == Some(false)
    }

    /// Whether unreferenced components are removed.
    pub fn prunes_orphans(&self) -> bool {
        self.is_active() && self.orphans != Some(true)
    }

    /// Every list, paired with its configuration key.
    pub(crate) fn lists(&self) -> [(&'static str, &IncludeExclude); 6] {
        [
            ("filters.operations", &self.operations),
            ("filters.tags", &self.tags),
            ("filters.schemas", &self.schemas),
            ("filters.parameters", &self.parameters),
            ("filters.requestBodies", &self.request_bodies),
            ("filters.responses", &self.responses),
        ]
    }
}

/// Inclusion and exclusion lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeExclude {
    /// Keep only matching entries (empty keeps everything).
    pub include: Vec<String>,
    /// Drop matching entries. Wins over `include`.
    pub exclude: Vec<String>,
}

impl IncludeExclude {
    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl ParserConfig {
    /// Loads a configuration from JSON or YAML text.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw configuration. JSON is valid YAML, so one parser covers both.
    pub fn from_text(text: &str) -> AppResult<Self> {
        let config: ParserConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipeline cannot honour.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_depth == 0 {
            return Err(AppError::Config("maxDepth must be greater than zero".into()));
        }
        self.transforms.enums.naming().validate("transforms.enums")?;
        self.transforms
            .read_write
            .requests
            .validate("transforms.readWrite.requests")?;
        self.transforms
            .read_write
            .responses
            .validate("transforms.readWrite.responses")?;
        self.pagination.matcher()?;
        for (key, list) in self.filters.lists() {
            for pattern in list.include.iter().chain(list.exclude.iter()) {
                if let Some(body) = regex_body(pattern) {
                    Regex::new(body)
                        .map_err(|e| AppError::Config(format!("{key}: `{pattern}`: {e}")))?;
                }
            }
        }
        Ok(())
    }
}

/// Returns the inner expression of a `/regex/` filter entry.
pub(crate) fn regex_body(pattern: &str) -> Option<&str> {
    if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

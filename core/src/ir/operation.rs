#![deny(missing_docs)]

//! # IR Operation
//!
//! Compiled operations, parameters, bodies and responses.

use crate::ir::schema::IrSchema;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// HTTP methods an operation can be declared under, in path-item visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// DELETE
    Delete,
    /// GET
    Get,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// PATCH
    Patch,
    /// POST
    Post,
    /// PUT
    Put,
    /// TRACE
    Trace,
}

impl HttpMethod {
    /// All methods in visiting order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Delete,
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Trace,
    ];

    /// Lower-case key used in path items.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "delete",
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Patch => "patch",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Trace => "trace",
        }
    }

    /// Parses a path-item key.
    pub fn from_key(key: &str) -> Option<Self> {
        HttpMethod::ALL.into_iter().find(|m| m.as_str() == key)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Builds the `"METHOD /path"` key used by filters and diagnostics.
pub fn operation_key(method: HttpMethod, path: &str) -> String {
    format!("{method} {path}")
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// `Cookie` header entry.
    Cookie,
    /// Request header.
    Header,
    /// Templated path segment.
    Path,
    /// Query string.
    Query,
}

impl ParameterLocation {
    /// Parses a dialect `in` value. Body-like locations return `None`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "cookie" => Some(ParameterLocation::Cookie),
            "header" => Some(ParameterLocation::Header),
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            _ => None,
        }
    }

    /// The serialization style used when none is declared.
    pub fn default_style(&self) -> &'static str {
        match self {
            ParameterLocation::Header | ParameterLocation::Path => "simple",
            ParameterLocation::Cookie | ParameterLocation::Query => "form",
        }
    }
}

/// A compiled parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrParameter {
    /// Wire name.
    pub name: String,
    /// Location.
    pub location: ParameterLocation,
    /// Value schema.
    pub schema: IrSchema,
    /// Serialization style (`form`, `simple`, `deepObject`, ...).
    pub style: String,
    /// Whether arrays/objects expand into separate parameters.
    pub explode: bool,
    /// Query only: reserved characters pass unencoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
    /// Whether the parameter must be sent.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Whether the name matched a pagination keyword.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pagination: bool,
    /// Deprecation flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `x-` vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Parameters partitioned by location, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrParameters {
    /// Cookie parameters.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub cookie: IndexMap<String, IrParameter>,
    /// Header parameters.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub header: IndexMap<String, IrParameter>,
    /// Path parameters.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path: IndexMap<String, IrParameter>,
    /// Query parameters.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, IrParameter>,
}

impl IrParameters {
    /// The map for one location.
    pub fn at(&self, location: ParameterLocation) -> &IndexMap<String, IrParameter> {
        match location {
            ParameterLocation::Cookie => &self.cookie,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
        }
    }

    /// Mutable map for one location.
    pub fn at_mut(&mut self, location: ParameterLocation) -> &mut IndexMap<String, IrParameter> {
        match location {
            ParameterLocation::Cookie => &mut self.cookie,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
        }
    }

    /// Inserts a parameter; a later entry with the same location and name replaces the earlier one.
    pub fn insert(&mut self, parameter: IrParameter) {
        self.at_mut(parameter.location)
            .insert(parameter.name.clone(), parameter);
    }

    /// Looks a parameter up by location and name.
    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&IrParameter> {
        self.at(location).get(name)
    }

    /// Whether no location holds a parameter.
    pub fn is_empty(&self) -> bool {
        self.cookie.is_empty() && self.header.is_empty() && self.path.is_empty() && self.query.is_empty()
    }
}

/// Family of a supported media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// `application/json` and `+json` types.
    Json,
    /// `application/x-www-form-urlencoded`.
    UrlSearchParams,
    /// `multipart/form-data`.
    FormData,
    /// `text/*`.
    Text,
    /// `application/octet-stream`.
    OctetStream,
}

/// Pagination marker on a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BodyPagination {
    /// The whole body is the pagination control.
    Whole(bool),
    /// Name of the pagination property inside the body.
    Field(String),
}

/// A compiled request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrBody {
    /// Chosen media type.
    pub media_type: String,
    /// Family of the chosen media type.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Body schema.
    pub schema: IrSchema,
    /// Whether a body must be sent.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Pagination marker, when one was detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<BodyPagination>,
}

/// A compiled response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrResponse {
    /// Chosen media type; absent when the response carries no supported content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Response schema (`void` / `unknown` when there is no content).
    pub schema: IrSchema,
}

/// A compiled operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOperation {
    /// Identifier used by emitters. Unique unless the document declared duplicates.
    pub id: String,
    /// The native `operationId`, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template, or webhook name.
    pub path: String,
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deprecation flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters by location.
    #[serde(skip_serializing_if = "IrParameters::is_empty")]
    pub parameters: IrParameters,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<IrBody>,
    /// Responses keyed by status code or `default`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, IrResponse>,
    /// Security schemes that apply, normalised to the V3 shape.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Value>,
    /// `x-` vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::schema::SchemaType;

    fn param(name: &str, location: ParameterLocation, kind: SchemaType) -> IrParameter {
        IrParameter {
            name: name.into(),
            location,
            schema: IrSchema::of_type(kind),
            style: location.default_style().into(),
            explode: true,
            allow_reserved: None,
            required: false,
            pagination: false,
            deprecated: None,
            description: None,
            extensions: IndexMap::new(),
        }
    }

    #[test]
    fn test_last_writer_wins_per_location_and_name() {
        let mut params = IrParameters::default();
        params.insert(param("id", ParameterLocation::Query, SchemaType::String));
        params.insert(param("id", ParameterLocation::Header, SchemaType::String));
        params.insert(param("id", ParameterLocation::Query, SchemaType::Integer));

        assert_eq!(params.query.len(), 1);
        assert!(params.get(ParameterLocation::Query, "id").unwrap().schema.is(SchemaType::Integer));
        assert!(params.get(ParameterLocation::Header, "id").is_some());
    }

    #[test]
    fn test_method_keys() {
        assert_eq!(HttpMethod::from_key("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::from_key("parameters"), None);
        assert_eq!(operation_key(HttpMethod::Get, "/pets"), "GET /pets");
    }

    #[test]
    fn test_default_styles() {
        assert_eq!(ParameterLocation::Path.default_style(), "simple");
        assert_eq!(ParameterLocation::Query.default_style(), "form");
        assert_eq!(ParameterLocation::from_keyword("body"), None);
    }

    #[test]
    fn test_body_pagination_serializes_untagged() {
        assert_eq!(serde_json::to_value(BodyPagination::Whole(true)).unwrap(), serde_json::json!(true));
        assert_eq!(
            serde_json::to_value(BodyPagination::Field("cursor".into())).unwrap(),
            serde_json::json!("cursor")
        );
    }
}

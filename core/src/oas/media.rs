#![deny(missing_docs)]

//! # Media Types
//!
//! Classifies media type strings and picks the one content entry the compiler
//! uses when several are declared.

use crate::ir::MediaKind;
use serde_json::{Map, Value};

/// Outcome of looking for a supported content entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Nothing was declared.
    Absent,
    /// Content was declared, but only in these unsupported media types.
    Unsupported(Vec<String>),
    /// A supported entry was chosen.
    Found(T),
}

/// Maps a media type string onto its family.
///
/// Parameters after `;` are ignored and matching is case-insensitive.
pub fn media_kind(media_type: &str) -> Option<MediaKind> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/json" | "*/*" => Some(MediaKind::Json),
        "application/x-www-form-urlencoded" => Some(MediaKind::UrlSearchParams),
        "multipart/form-data" => Some(MediaKind::FormData),
        "application/octet-stream" => Some(MediaKind::OctetStream),
        s if s.ends_with("+json") || s.ends_with("/json") => Some(MediaKind::Json),
        s if s.starts_with("text/") => Some(MediaKind::Text),
        _ => None,
    }
}

fn rank(kind: MediaKind) -> u8 {
    match kind {
        MediaKind::Json => 0,
        MediaKind::UrlSearchParams => 1,
        MediaKind::FormData => 2,
        MediaKind::Text => 3,
        MediaKind::OctetStream => 4,
    }
}

/// Picks the highest-priority supported media type from a list.
///
/// Ties keep declaration order.
pub fn select_type<'a, I>(types: I) -> Lookup<(String, MediaKind)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(String, MediaKind)> = None;
    let mut skipped = Vec::new();
    for media_type in types {
        match media_kind(media_type) {
            Some(kind) => {
                if best.as_ref().map_or(true, |(_, b)| rank(kind) < rank(*b)) {
                    best = Some((media_type.to_string(), kind));
                }
            }
            None => skipped.push(media_type.to_string()),
        }
    }
    match best {
        Some(found) => Lookup::Found(found),
        None if skipped.is_empty() => Lookup::Absent,
        None => Lookup::Unsupported(skipped),
    }
}

/// Picks the media type object to use from a V3 `content` map.
pub fn select_content(content: &Map<String, Value>) -> Lookup<(String, MediaKind, &Value)> {
    match select_type(content.keys().map(String::as_str)) {
        Lookup::Found((media_type, kind)) => match content.get(&media_type) {
            Some(object) => Lookup::Found((media_type, kind, object)),
            None => Lookup::Absent,
        },
        Lookup::Unsupported(types) => Lookup::Unsupported(types),
        Lookup::Absent => Lookup::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind("application/json; charset=utf-8"), Some(MediaKind::Json));
        assert_eq!(media_kind("application/problem+json"), Some(MediaKind::Json));
        assert_eq!(media_kind("text/plain"), Some(MediaKind::Text));
        assert_eq!(media_kind("multipart/form-data"), Some(MediaKind::FormData));
        assert_eq!(media_kind("application/xml"), None);
    }

    #[test]
    fn test_json_preferred_over_declaration_order() {
        let content = json!({
            "text/plain": {"schema": {"type": "string"}},
            "application/xml": {},
            "application/json": {"schema": {"type": "object"}}
        });
        match select_content(content.as_object().unwrap()) {
            Lookup::Found((media_type, kind, object)) => {
                assert_eq!(media_type, "application/json");
                assert_eq!(kind, MediaKind::Json);
                assert_eq!(object["schema"]["type"], "object");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_only_unsupported_types() {
        let content = json!({"application/xml": {}});
        assert_eq!(
            select_content(content.as_object().unwrap()),
            Lookup::Unsupported(vec!["application/xml".to_string()])
        );
        assert_eq!(select_type(Vec::<&str>::new()), Lookup::Absent);
    }
}

//! Property-path resolution over structured row values.
//!
//! Formatting pulls nested values out of row structures by path. A path is
//! written the way accessors are written in listing configs: dotted keys for
//! object access and bracketed indexes for array access, e.g.
//! `address.tags[0]`.

use crate::error::{Error, PathError, Result};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key access
    Key(String),
    /// Array index access
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// A parsed access path into a structured row value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

// Matches one leading segment: an (optionally dot-prefixed) key or a
// bracketed numeric index.
fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\.?([A-Za-z_][A-Za-z0-9_]*)|\[([0-9]+)\])").expect("valid segment regex")
    })
}

impl PropertyPath {
    /// Parse a path string such as `address.tags[0]`.
    ///
    /// Fails with `InvalidArgument` when the string is empty or contains
    /// anything outside the key/index grammar.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::invalid_argument("path", "must not be empty"));
        }
        if path.starts_with('.') {
            return Err(Error::invalid_argument(
                "path",
                format!("'{path}' must not start with a separator"),
            ));
        }

        let mut segments = Vec::new();
        let mut rest = path;
        while !rest.is_empty() {
            let captures = segment_re().captures(rest).ok_or_else(|| {
                Error::invalid_argument("path", format!("'{path}' is not a valid property path"))
            })?;
            if let Some(key) = captures.get(1) {
                segments.push(PathSegment::Key(key.as_str().to_string()));
            } else if let Some(index) = captures.get(2) {
                let index = index.as_str().parse().map_err(|_| {
                    Error::invalid_argument("path", format!("index out of range in '{path}'"))
                })?;
                segments.push(PathSegment::Index(index));
            }
            rest = &rest[captures.get(0).expect("whole match").end()..];
        }

        Ok(Self { segments })
    }

    /// Build a path from plain object keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: keys
                .into_iter()
                .map(|k| PathSegment::Key(k.into()))
                .collect(),
        }
    }

    /// Append an object key segment.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Append an array index segment.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// The parsed segments, in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i > 0 => write!(f, ".{k}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

/// Resolve `path` within `value`.
///
/// Keys resolve inside objects, indexes inside arrays; an index against an
/// object falls back to its decimal string key, matching array-style access
/// on mapping containers. A missing key/index or a scalar mid-path fails
/// with a `Path` error.
pub fn resolve<'v>(value: &'v Value, path: &PropertyPath) -> Result<&'v Value> {
    let mut current = value;
    for segment in path.segments() {
        let next = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        };
        current = next.ok_or_else(|| {
            tracing::debug!(path = %path, segment = %segment, "path resolution miss");
            Error::from(PathError::not_found(path.to_string(), segment))
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dotted_and_indexed_paths() {
        let path = PropertyPath::parse("address.tags[0].label").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("address".to_string()),
                PathSegment::Key("tags".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("label".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "address.tags[0].label");
    }

    #[test]
    fn parses_leading_index() {
        let path = PropertyPath::parse("[2]").unwrap();
        assert_eq!(path.segments(), &[PathSegment::Index(2)]);
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse(".email").is_err());
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("a[x]").is_err());
    }

    #[test]
    fn resolves_nested_values() {
        let row = json!({
            "email": "jane@example.com",
            "address": { "city": "Wroclaw", "tags": ["home", "billing"] }
        });

        let email = resolve(&row, &PropertyPath::from_keys(["email"])).unwrap();
        assert_eq!(email, &json!("jane@example.com"));

        let tag = resolve(&row, &PropertyPath::parse("address.tags[1]").unwrap()).unwrap();
        assert_eq!(tag, &json!("billing"));
    }

    #[test]
    fn index_against_object_uses_string_key() {
        let row = json!({ "0": "first" });
        let value = resolve(&row, &PropertyPath::parse("[0]").unwrap()).unwrap();
        assert_eq!(value, &json!("first"));
    }

    #[test]
    fn missing_segment_is_a_path_error() {
        let row = json!({ "address": {} });
        let err = resolve(&row, &PropertyPath::parse("address.city").unwrap()).unwrap_err();
        assert!(err.is_path());
    }

    #[test]
    fn scalar_mid_path_is_a_path_error() {
        let row = json!({ "email": "jane@example.com" });
        let err = resolve(&row, &PropertyPath::parse("email.domain").unwrap()).unwrap_err();
        assert!(err.is_path());
    }
}

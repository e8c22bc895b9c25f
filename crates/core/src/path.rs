//! Dot-path field lookup into nested records.
//!
//! `"buyer.address.country"` descends through object keys only. There is
//! no wildcard or array-index syntax; anything that is not an object
//! before the path is exhausted resolves to `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Resolve a dot-separated `path` against `record`.
///
/// Returns `None` when a segment is missing, when an intermediate value
/// is not an object, or when the path (or any segment) is empty.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(record, |current, key| {
        if key.is_empty() {
            return None;
        }
        current.as_object()?.get(key)
    })
}

/// A field path split into segments once and reused across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// An empty path, or one with an empty segment, can never resolve.
    pub fn is_well_formed(&self) -> bool {
        !self.raw.is_empty() && self.segments.iter().all(|s| !s.is_empty())
    }

    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        if !self.is_well_formed() {
            return None;
        }
        self.segments
            .iter()
            .try_fold(record, |current, key| current.as_object()?.get(key))
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        FieldPath::new(raw)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        FieldPath::new(raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

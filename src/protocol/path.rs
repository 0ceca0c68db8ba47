//! Dotted JSON paths into Engine replies.
//!
//! A [`ResultPath`] such as `result.qProp` is resolved against the whole
//! reply frame. Paths are configured per call site and carried inside the
//! correlation table, so the table never hardcodes where a payload lives.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::Value;

// ============================================================================
// ResultPath
// ============================================================================

/// A dotted path (`a.b.c`) into a JSON reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultPath {
    /// Path as written, e.g. `result.qProp`.
    dotted: String,
    /// Same path as an RFC 6901 JSON pointer, e.g. `/result/qProp`.
    pointer: String,
}

impl ResultPath {
    /// Creates a path from its dotted form.
    #[must_use]
    pub fn new(dotted: impl Into<String>) -> Self {
        let dotted = dotted.into();
        let pointer = dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
            .collect();

        Self { dotted, pointer }
    }

    /// `result.qProp`: payload of a `GetProperties` reply.
    #[must_use]
    pub fn properties() -> Self {
        Self::new("result.qProp")
    }

    /// `result.qInfos`: inventory of a `GetAllInfos` reply.
    #[must_use]
    pub fn inventory() -> Self {
        Self::new("result.qInfos")
    }

    /// `result.qReturn.qHandle`: handle returned by open calls.
    #[must_use]
    pub fn returned_handle() -> Self {
        Self::new("result.qReturn.qHandle")
    }

    /// Returns the dotted form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.dotted
    }

    /// Looks the path up in `root`.
    #[inline]
    #[must_use]
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        root.pointer(&self.pointer)
    }

    /// Extracts the payloads found at the path.
    ///
    /// An array contributes each of its elements, any other value
    /// contributes itself. Returns `None` if the path is missing or null.
    #[must_use]
    pub fn harvest(&self, root: &Value) -> Option<Vec<Value>> {
        match self.lookup(root)? {
            Value::Null => None,
            Value::Array(items) => Some(items.clone()),
            other => Some(vec![other.clone()]),
        }
    }
}

impl From<&str> for ResultPath {
    fn from(dotted: &str) -> Self {
        Self::new(dotted)
    }
}

impl fmt::Display for ResultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

// ============================================================================
// Tests
// ============================================================================

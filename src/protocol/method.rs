//! Engine API method names.
//!
//! Only the calls needed to walk a document's inventory are modelled.
//!
//! | Method | Handle | Returns |
//! |--------|--------|---------|
//! | `OpenDoc` | session (`-1`) | document handle |
//! | `GetAllInfos` | document | `qInfos` inventory |
//! | `GetDimension` | document | dimension handle |
//! | `GetMeasure` | document | measure handle |
//! | `GetObject` | document | generic object handle |
//! | `GetProperties` | object | `qProp` payload |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Method
// ============================================================================

/// An Engine API method understood by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Opens an app and returns the document handle.
    OpenDoc,
    /// Lists every object in the document.
    GetAllInfos,
    /// Opens a master dimension.
    GetDimension,
    /// Opens a master measure.
    GetMeasure,
    /// Opens a generic object (sheet, master visualization, ...).
    GetObject,
    /// Fetches the properties of an open object.
    GetProperties,
}

impl Method {
    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenDoc => "OpenDoc",
            Self::GetAllInfos => "GetAllInfos",
            Self::GetDimension => "GetDimension",
            Self::GetMeasure => "GetMeasure",
            Self::GetObject => "GetObject",
            Self::GetProperties => "GetProperties",
        }
    }

    /// Returns `true` for methods that open an inventory item by `qId`.
    #[inline]
    #[must_use]
    pub const fn opens_object(self) -> bool {
        matches!(self, Self::GetDimension | Self::GetMeasure | Self::GetObject)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_name_matches_as_str() {
        for method in [
            Method::OpenDoc,
            Method::GetAllInfos,
            Method::GetDimension,
            Method::GetMeasure,
            Method::GetObject,
            Method::GetProperties,
        ] {
            let json = serde_json::to_string(&method).expect("serialize");
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_opens_object() {
        assert!(Method::GetMeasure.opens_object());
        assert!(Method::GetObject.opens_object());
        assert!(!Method::OpenDoc.opens_object());
        assert!(!Method::GetProperties.opens_object());
    }
}

//! Per-object-kind workflow definitions.
//!
//! Every kind of object is scraped the same way:
//!
//! ```text
//! OpenDoc ──► GetAllInfos ──► {open item}×N ──► {GetProperties}×N
//! ```
//!
//! Kinds differ only in the inventory type they keep, the method that opens
//! an item, and where the payload sits in the final reply. [`Workflow`]
//! carries exactly those three values.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::protocol::{Method, Reply, ResultPath};

// ============================================================================
// Constants
// ============================================================================

/// Registry name of the open document's handle.
pub const DOC_HANDLE: &str = "doc-handle";

// ============================================================================
// ObjectKind
// ============================================================================

/// The standard object kinds scraped from an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Master dimensions.
    Dimension,
    /// Master measures.
    Measure,
    /// Sheets.
    Sheet,
    /// Master visualizations.
    Visualization,
}

impl ObjectKind {
    /// All standard kinds.
    pub const ALL: [Self; 4] = [
        Self::Dimension,
        Self::Measure,
        Self::Sheet,
        Self::Visualization,
    ];

    /// `qType` of matching inventory entries.
    #[must_use]
    pub const fn inventory_type(self) -> &'static str {
        match self {
            Self::Dimension => "dimension",
            Self::Measure => "measure",
            Self::Sheet => "sheet",
            Self::Visualization => "masterobject",
        }
    }

    /// Method that opens one matching entry.
    #[must_use]
    pub const fn open_method(self) -> Method {
        match self {
            Self::Dimension => Method::GetDimension,
            Self::Measure => Method::GetMeasure,
            Self::Sheet | Self::Visualization => Method::GetObject,
        }
    }

    /// The workflow scraping this kind.
    #[must_use]
    pub fn workflow(self) -> Workflow {
        Workflow {
            target_type: self.inventory_type().to_owned(),
            open_method: self.open_method(),
            result_path: ResultPath::properties(),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dimension => "dimensions",
            Self::Measure => "measures",
            Self::Sheet => "sheets",
            Self::Visualization => "visualizations",
        };
        f.write_str(name)
    }
}

// ============================================================================
// InventoryEntry
// ============================================================================

/// One entry of a `GetAllInfos` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryEntry {
    /// Object id, passed to the open call.
    #[serde(rename = "qId")]
    pub id: String,

    /// Object type, e.g. `measure`.
    #[serde(rename = "qType")]
    pub object_type: String,
}

// ============================================================================
// Workflow
// ============================================================================

/// Parameters of the generic scrape workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    target_type: String,
    open_method: Method,
    result_path: ResultPath,
}

impl Workflow {
    /// Creates a custom workflow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `target_type` is empty or `open_method`
    /// does not open objects by `qId`.
    pub fn new(
        target_type: impl Into<String>,
        open_method: Method,
        result_path: impl Into<ResultPath>,
    ) -> Result<Self> {
        let target_type = target_type.into();

        if target_type.is_empty() {
            return Err(Error::config("workflow target type must not be empty"));
        }
        if !open_method.opens_object() {
            return Err(Error::config(format!(
                "{open_method} cannot open inventory items; use GetDimension, GetMeasure or GetObject"
            )));
        }

        Ok(Self {
            target_type,
            open_method,
            result_path: result_path.into(),
        })
    }

    /// Inventory `qType` this workflow keeps.
    #[inline]
    #[must_use]
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Method opening each kept item.
    #[inline]
    #[must_use]
    pub fn open_method(&self) -> Method {
        self.open_method
    }

    /// Path of the payload in `GetProperties` replies.
    #[inline]
    #[must_use]
    pub fn result_path(&self) -> &ResultPath {
        &self.result_path
    }

    /// Returns the entries of an inventory reply that match the target type.
    ///
    /// Returns `None` if the reply has no `qInfos` list. Entries that do not
    /// parse are skipped with a warning.
    #[must_use]
    pub fn select(&self, reply: &Reply) -> Option<Vec<InventoryEntry>> {
        let infos = reply.lookup(&ResultPath::inventory())?.as_array()?;

        let selected = infos
            .iter()
            .filter_map(|info| match InventoryEntry::deserialize(info) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(request_id = %reply.id, error = %e, entry = %info, "Skipping inventory entry");
                    None
                }
            })
            .filter(|entry| entry.object_type == self.target_type)
            .collect();

        Some(selected)
    }
}

impl From<ObjectKind> for Workflow {
    fn from(kind: ObjectKind) -> Self {
        kind.workflow()
    }
}

/// Returns the `qProp.qInfo.qId` of a harvested payload, if present.
#[must_use]
pub fn object_id(properties: &Value) -> Option<&str> {
    properties.pointer("/qInfo/qId").and_then(Value::as_str)
}

// ============================================================================
// Tests
// ============================================================================

//! Outbound request frames.
//!
//! # Format
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 1,
//!   "handle": -1,
//!   "method": "OpenDoc",
//!   "params": { "qDocName": "app-id" }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Value, json};

use crate::identifiers::{Handle, RequestId};

use super::Method;

// ============================================================================
// Constants
// ============================================================================

/// JSON-RPC version spoken by the engine.
const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// Request
// ============================================================================

/// A request from the local end to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,

    /// Correlation id, echoed by the reply.
    pub id: RequestId,

    /// Object the call targets; [`Handle::SESSION`] for session calls.
    pub handle: Handle,

    /// Engine API method.
    pub method: Method,

    /// Method parameters.
    pub params: Value,
}

impl Request {
    /// Creates a request with explicit parameters.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, handle: Handle, method: Method, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            handle,
            method,
            params,
        }
    }

    /// `OpenDoc` on the session handle.
    #[must_use]
    pub fn open_doc(id: RequestId, app_id: &str) -> Self {
        Self::new(id, Handle::SESSION, Method::OpenDoc, json!({ "qDocName": app_id }))
    }

    /// `GetAllInfos` on a document.
    #[must_use]
    pub fn get_all_infos(id: RequestId, doc: Handle) -> Self {
        Self::new(id, doc, Method::GetAllInfos, json!({}))
    }

    /// Opens one inventory item (`GetDimension`, `GetMeasure`, `GetObject`).
    #[must_use]
    pub fn open_object(id: RequestId, doc: Handle, method: Method, object_id: &str) -> Self {
        Self::new(id, doc, method, json!({ "qId": object_id }))
    }

    /// `GetProperties` on an open object.
    #[must_use]
    pub fn get_properties(id: RequestId, object: Handle) -> Self {
        Self::new(id, object, Method::GetProperties, json!({}))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_doc_serialization() {
        let request = Request::open_doc(RequestId::new(1), "sales.qvf");
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "handle": -1,
                "method": "OpenDoc",
                "params": {"qDocName": "sales.qvf"}
            })
        );
    }

    #[test]
    fn test_open_object_targets_document() {
        let request = Request::open_object(
            RequestId::new(4),
            Handle::new(1),
            Method::GetMeasure,
            "m1",
        );
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["handle"], 1);
        assert_eq!(json["method"], "GetMeasure");
        assert_eq!(json["params"]["qId"], "m1");
    }

    #[test]
    fn test_get_properties_targets_object() {
        let request = Request::get_properties(RequestId::new(9), Handle::new(7));
        assert_eq!(request.handle, Handle::new(7));
        assert_eq!(request.method, Method::GetProperties);
        assert_eq!(request.params, json!({}));
    }
}

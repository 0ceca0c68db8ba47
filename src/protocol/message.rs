//! Inbound message types.
//!
//! Every frame the engine sends is either a reply correlated to one of our
//! requests or an unsolicited notification. The presence of an `id` field is
//! the only discriminator; payload content is never consulted.
//!
//! # Formats
//!
//! Reply:
//! ```json
//! { "jsonrpc": "2.0", "id": 3, "result": { "qReturn": { "qHandle": 1 } } }
//! ```
//!
//! Error reply:
//! ```json
//! { "jsonrpc": "2.0", "id": 3, "error": { "code": 1002, "parameter": "", "message": "App already open" } }
//! ```
//!
//! Notification:
//! ```json
//! { "jsonrpc": "2.0", "method": "OnConnected", "params": { "qSessionState": "SESSION_CREATED" } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::{Handle, RequestId};

use super::ResultPath;

// ============================================================================
// Constants
// ============================================================================

/// Pushed once the session is attached.
pub const ON_CONNECTED: &str = "OnConnected";

/// Pushed when the user exceeds the engine's parallel session limit.
pub const ON_MAX_PARALLEL_SESSIONS_EXCEEDED: &str = "OnMaxParallelSessionsExceeded";

// ============================================================================
// IncomingMessage
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// Frame with an `id`: answers one of our requests.
    Correlated(Reply),
    /// Frame without an `id`: pushed by the engine.
    Notification(Notification),
}

impl IncomingMessage {
    /// Parses and classifies one text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not valid JSON
    /// - [`Error::Protocol`] if the frame is not an object, carries a
    ///   non-integer `id`, or is a notification without `method`
    pub fn parse(text: &str) -> Result<Self> {
        let Value::Object(mut frame) = serde_json::from_str::<Value>(text)? else {
            return Err(Error::protocol("frame is not a JSON object"));
        };

        if let Some(id) = frame.get("id") {
            let id = id
                .as_u64()
                .ok_or_else(|| Error::protocol(format!("invalid reply id: {id}")))?;
            return Ok(Self::Correlated(Reply::new(RequestId::new(id), frame)));
        }

        let method = match frame.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(Error::protocol("notification without method")),
        };
        let params = frame.remove("params").unwrap_or(Value::Null);

        Ok(Self::Notification(Notification { method, params }))
    }
}

// ============================================================================
// Reply
// ============================================================================

/// A reply correlated to a request by id.
///
/// The whole frame is kept so result paths resolve from its root.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Id of the request being answered.
    pub id: RequestId,
    frame: Value,
}

impl Reply {
    /// Wraps a parsed frame.
    #[must_use]
    pub fn new(id: RequestId, frame: Map<String, Value>) -> Self {
        Self {
            id,
            frame: Value::Object(frame),
        }
    }

    /// Returns the raw frame.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> &Value {
        &self.frame
    }

    /// Returns the `result` member, if any.
    #[inline]
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.frame.get("result")
    }

    /// Returns the engine error carried instead of a result, if any.
    #[must_use]
    pub fn error(&self) -> Option<EngineError> {
        let error = self.frame.get("error")?;
        Some(EngineError::deserialize(error).unwrap_or_else(|_| EngineError {
            code: 0,
            parameter: String::new(),
            message: error.to_string(),
        }))
    }

    /// Looks up a path from the frame root.
    #[inline]
    #[must_use]
    pub fn lookup(&self, path: &ResultPath) -> Option<&Value> {
        path.lookup(&self.frame)
    }

    /// Returns the handle an open call returned.
    #[must_use]
    pub fn returned_handle(&self) -> Option<Handle> {
        self.lookup(&ResultPath::returned_handle())
            .and_then(Value::as_i64)
            .map(Handle::new)
    }
}

// ============================================================================
// EngineError
// ============================================================================

/// Error object returned by the engine in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineError {
    /// Engine error code.
    pub code: i64,

    /// Offending parameter, if reported.
    #[serde(default)]
    pub parameter: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Notification
// ============================================================================

/// A notification pushed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Notification name, e.g. `OnConnected`.
    pub method: String,

    /// Notification payload (`null` if absent).
    pub params: Value,
}

// ============================================================================
// Tests
// ============================================================================

//! Error types for the Qlik Engine scraper.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use qlik_engine_scraper::{EngineScraper, ObjectKind, Result};
//!
//! async fn example(scraper: &EngineScraper) -> Result<()> {
//!     let measures = scraper.scrape("app-1", ObjectKind::Measure).await?;
//!     println!("{} measures", measures.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Authentication`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::FatalNotification`], [`Error::Engine`], [`Error::Protocol`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |
//!
//! A scrape that runs out of time is not an error: the facade resolves it
//! to an empty result list.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when scraper configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The authenticator could not supply session credentials.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Description of the authentication failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection could not be opened.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The engine closed the socket while work was still outstanding.
    ///
    /// Distinct from a timeout: the server went away unexpectedly.
    #[error("Connection closed with {pending} pending request(s) and {unhandled} unhandled reply(ies)")]
    ConnectionClosed {
        /// Requests sent but never answered.
        pending: usize,
        /// Replies received but not yet processed.
        unhandled: usize,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The engine pushed a notification that invalidates the session.
    ///
    /// Any partially harvested results are discarded.
    #[error("Fatal engine notification {method}: {params}")]
    FatalNotification {
        /// Notification method, e.g. `OnMaxParallelSessionsExceeded`.
        method: String,
        /// Notification params, rendered as JSON.
        params: String,
    },

    /// The engine refused a document-level call (`OpenDoc`, `GetAllInfos`).
    ///
    /// Raised for a missing or inaccessible app, as opposed to an app that
    /// simply has no objects of the requested kind.
    #[error("Engine rejected {method} (code {code}): {message}")]
    Engine {
        /// Method the engine answered with an error.
        method: String,
        /// Engine error code.
        code: i64,
        /// Engine error message.
        message: String,
    },

    /// Protocol violation or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[inline]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a premature connection closure error.
    #[inline]
    pub fn connection_closed(pending: usize, unhandled: usize) -> Self {
        Self::ConnectionClosed { pending, unhandled }
    }

    /// Creates a fatal notification error.
    #[inline]
    pub fn fatal_notification(method: impl Into<String>, params: &serde_json::Value) -> Self {
        Self::FatalNotification {
            method: method.into(),
            params: params.to_string(),
        }
    }

    /// Creates an error for an engine error reply to `method`.
    #[inline]
    pub fn engine(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::Engine {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a protocol error for a request id registered twice.
    #[inline]
    pub fn duplicate_request(request_id: RequestId) -> Self {
        Self::protocol(format!("request id {request_id} is already pending"))
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed { .. } | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the engine aborted the session with a notification.
    #[inline]
    #[must_use]
    pub fn is_fatal_notification(&self) -> bool {
        matches!(self, Self::FatalNotification { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

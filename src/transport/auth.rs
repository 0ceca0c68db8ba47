//! Session credentials for the WebSocket handshake.
//!
//! Authentication flows themselves (NTLM, header, ticket) live outside this
//! crate. They hand over a session cookie through [`Authenticator`], which
//! is attached as the `Cookie` header when each connection is opened.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Cookie issued by the Qlik proxy for an authenticated session.
pub const QLIK_SESSION_COOKIE: &str = "X-Qlik-Session";

// ============================================================================
// Authenticator
// ============================================================================

/// Supplies the session cookie used when opening a connection.
///
/// Called once per connection, so implementations may refresh credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the full `Cookie` header value, or `None` for anonymous access.
    async fn session_cookie(&self) -> Result<Option<String>>;
}

// ============================================================================
// NoAuthentication
// ============================================================================

/// Anonymous access (e.g. Qlik Sense Desktop).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthentication;

#[async_trait]
impl Authenticator for NoAuthentication {
    async fn session_cookie(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

// ============================================================================
// SessionCookie
// ============================================================================

/// A fixed `name=value` cookie obtained beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    value: String,
}

impl SessionCookie {
    /// Creates a cookie with an arbitrary name.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates an `X-Qlik-Session` cookie.
    #[must_use]
    pub fn qlik_session(value: impl Into<String>) -> Self {
        Self::new(QLIK_SESSION_COOKIE, value)
    }

    /// Returns the header value, `name=value`.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

#[async_trait]
impl Authenticator for SessionCookie {
    async fn session_cookie(&self) -> Result<Option<String>> {
        Ok(Some(self.header_value()))
    }
}

// ============================================================================
// Tests
// ============================================================================

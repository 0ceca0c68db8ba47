//! Builder pattern for scraper configuration.
//!
//! Provides a fluent API for configuring and creating [`EngineScraper`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use qlik_engine_scraper::EngineScraper;
//!
//! # fn example() -> qlik_engine_scraper::Result<()> {
//! let scraper = EngineScraper::builder()
//!     .server("https://qlik.example.com")
//!     .virtual_proxy("sso")
//!     .session_cookie("X-Qlik-Session", "0f3c...")
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{Authenticator, NoAuthentication, SessionCookie};

use super::core::EngineScraper;
use super::options::ScraperOptions;

// ============================================================================
// EngineScraperBuilder
// ============================================================================

/// Builder for configuring an [`EngineScraper`].
///
/// Use [`EngineScraper::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct EngineScraperBuilder {
    /// Engine base URL.
    server: Option<String>,
    /// Virtual proxy prefix.
    virtual_proxy: Option<String>,
    /// Scrape deadline.
    timeout: Option<Duration>,
    /// Extra fatal notification methods.
    fatal_notifications: Vec<String>,
    /// Session credentials.
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl fmt::Debug for EngineScraperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineScraperBuilder")
            .field("server", &self.server)
            .field("virtual_proxy", &self.virtual_proxy)
            .field("timeout", &self.timeout)
            .field("fatal_notifications", &self.fatal_notifications)
            .field("authenticated", &self.authenticator.is_some())
            .finish()
    }
}

// ============================================================================
// EngineScraperBuilder Implementation
// ============================================================================

impl EngineScraperBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine base URL.
    ///
    /// # Arguments
    ///
    /// * `url` - `http`, `https`, `ws` or `wss` URL of the Qlik server
    #[inline]
    #[must_use]
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.server = Some(url.into());
        self
    }

    /// Sets the virtual proxy prefix.
    #[inline]
    #[must_use]
    pub fn virtual_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.virtual_proxy = Some(prefix.into());
        self
    }

    /// Sets the per-scrape deadline. Defaults to 60 seconds.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a notification method that aborts a scrape.
    ///
    /// `OnMaxParallelSessionsExceeded` is always fatal.
    #[inline]
    #[must_use]
    pub fn fatal_notification(mut self, method: impl Into<String>) -> Self {
        self.fatal_notifications.push(method.into());
        self
    }

    /// Sets the credential source consulted for each connection.
    #[must_use]
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Uses a fixed `name=value` session cookie.
    #[must_use]
    pub fn session_cookie(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.authenticator(SessionCookie::new(name, value))
    }

    /// Builds the scraper with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no server is set or it is not a valid URL
    /// - [`Error::Config`] if the timeout is zero
    pub fn build(self) -> Result<EngineScraper> {
        let options = self.validate_options()?;
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(NoAuthentication));

        Ok(EngineScraper::new(options, authenticator))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl EngineScraperBuilder {
    /// Validates settings and assembles the options.
    fn validate_options(&self) -> Result<ScraperOptions> {
        let server = self.server.as_deref().ok_or_else(|| {
            Error::config(
                "Engine server is required. Use .server() to set it.\n\
                 Example: EngineScraper::builder().server(\"https://qlik.example.com\")",
            )
        })?;

        let mut options = ScraperOptions::new(server)?;

        if let Some(prefix) = &self.virtual_proxy {
            options = options.with_virtual_proxy(prefix.as_str());
        }

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(Error::config("Scrape timeout must be greater than zero"));
            }
            options = options.with_timeout(timeout);
        }

        for method in &self.fatal_notifications {
            options = options.with_fatal_notification(method.as_str());
        }

        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================

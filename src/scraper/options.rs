//! Scraper connection options.
//!
//! Provides a type-safe description of where the engine lives, how long a
//! scrape may take, and which notifications abort a session.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use qlik_engine_scraper::ScraperOptions;
//!
//! let options = ScraperOptions::new("https://qlik.example.com")?
//!     .with_virtual_proxy("sso")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let url = options.app_url("0b9c7e4a-1111-2222-3333-444455556666");
//! // wss://qlik.example.com/sso/app/0b9c7e4a-1111-2222-3333-444455556666
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashSet;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::ON_MAX_PARALLEL_SESSIONS_EXCEEDED;

// ============================================================================
// Constants
// ============================================================================

/// Default deadline of one scrape.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// ScraperOptions
// ============================================================================

/// Engine endpoint and scrape behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperOptions {
    /// Engine base URL, always `ws://` or `wss://`.
    pub server: Url,

    /// Virtual proxy prefix inserted before `/app/`.
    pub virtual_proxy: Option<String>,

    /// Deadline of one scrape, connection included.
    pub timeout: Duration,

    /// Notification methods that abort a scrape.
    pub fatal_notifications: FxHashSet<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl ScraperOptions {
    /// Creates options for `server` with default settings.
    ///
    /// `http`/`https` URLs are mapped to `ws`/`wss`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `server` is not an absolute
    /// `http`, `https`, `ws` or `wss` URL with a host.
    pub fn new(server: &str) -> Result<Self> {
        Ok(Self {
            server: websocket_base(server)?,
            virtual_proxy: None,
            timeout: DEFAULT_SCRAPE_TIMEOUT,
            fatal_notifications: std::iter::once(ON_MAX_PARALLEL_SESSIONS_EXCEEDED.to_owned())
                .collect(),
        })
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ScraperOptions {
    /// Sets the virtual proxy prefix (slashes are trimmed).
    #[must_use]
    pub fn with_virtual_proxy(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_matches('/');
        self.virtual_proxy = (!prefix.is_empty()).then(|| prefix.to_owned());
        self
    }

    /// Sets the scrape deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a notification method that aborts a scrape.
    #[must_use]
    pub fn with_fatal_notification(mut self, method: impl Into<String>) -> Self {
        self.fatal_notifications.insert(method.into());
        self
    }
}

// ============================================================================
// URL Construction
// ============================================================================

impl ScraperOptions {
    /// Returns the WebSocket URL of one app.
    ///
    /// Format: `ws[s]://host[:port][/base][/proxy]/app/{appId}`, with the
    /// app id percent-encoded.
    #[must_use]
    pub fn app_url(&self, app_id: &str) -> Url {
        let mut url = self.server.clone();

        let mut path = url.path().trim_end_matches('/').to_owned();
        if let Some(proxy) = &self.virtual_proxy {
            path.push('/');
            path.push_str(proxy);
        }
        path.push_str("/app/");
        path.push_str(&urlencoding::encode(app_id));

        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// Parses `server` and maps it onto a WebSocket scheme.
fn websocket_base(server: &str) -> Result<Url> {
    let mut url = Url::parse(server).map_err(|e| {
        Error::config(format!(
            "Invalid engine server URL {server:?}: {e}\n\
             Example: EngineScraper::builder().server(\"https://qlik.example.com\")"
        ))
    })?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::config(format!(
                "Unsupported engine URL scheme {other:?}; use http, https, ws or wss"
            )));
        }
    };

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::config(format!("Engine server URL {server:?} has no host")));
    }

    url.set_scheme(scheme)
        .map_err(|()| Error::config(format!("Cannot use scheme {scheme} for {server:?}")))?;
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================

//! Qlik Engine scraper - metadata extraction over the Engine JSON-RPC API.
//!
//! This library connects to a Qlik Associative Engine over WebSocket and
//! collects the properties of master dimensions, master measures, sheets and
//! master visualizations of an app.
//!
//! # Architecture
//!
//! Each scrape owns exactly one WebSocket and runs two futures over it:
//!
//! - **Receiver**: reads frames, tells correlated replies from notifications,
//!   aborts on fatal notifications
//! - **Workflow engine**: sends requests, owns the correlation table and
//!   fans out one request chain per matching inventory item
//!
//! Key design principles:
//!
//! - Replies are matched to requests by explicit id, never by arrival order
//! - Every id is registered before its request is written
//! - The session ends once nothing is pending and nothing is queued
//! - A single deadline wraps the whole scrape; expiry yields an empty list
//!
//! # Quick Start
//!
//! ```no_run
//! use qlik_engine_scraper::{EngineScraper, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scraper = EngineScraper::builder()
//!         .server("https://qlik.example.com")
//!         .virtual_proxy("sso")
//!         .session_cookie("X-Qlik-Session", "0f3c...")
//!         .build()?;
//!
//!     let dimensions = scraper.get_dimensions("0b9c7e4a-1111-2222-3333-444455556666").await?;
//!     println!("{} master dimensions", dimensions.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`engine`] | Correlation table, receiver, workflow engine |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | JSON-RPC frame types |
//! | [`scraper`] | [`EngineScraper`] facade and configuration |
//! | [`transport`] | WebSocket connection and authentication |
//!
//! # Features
//!
//! - `native-tls`: `wss://` support through `tokio-tungstenite`

// ============================================================================
// Modules
// ============================================================================

/// Conversation engine: correlation, receiver, workflow driver.
///
/// - [`CorrelationTable`](engine::CorrelationTable) - pending calls and results
/// - [`WorkflowEngine`](engine::WorkflowEngine) - outbound request loop
/// - [`Receiver`](engine::Receiver) - inbound frame loop
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for requests and engine handles.
///
/// Newtype wrappers prevent mixing request ids and handles at compile time.
pub mod identifiers;

/// Engine API wire types.
pub mod protocol;

/// Scraper facade and configuration.
///
/// Use [`EngineScraper::builder()`] to create a configured scraper.
pub mod scraper;

/// WebSocket transport layer.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Scraper types
pub use scraper::{AppMetadata, EngineScraper, EngineScraperBuilder, ScraperOptions};

// Workflow types
pub use engine::{ObjectKind, Workflow};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{Handle, RequestId};

// Protocol types
pub use protocol::{Method, ResultPath};

// Transport types
pub use transport::{Authenticator, NoAuthentication, SessionCookie};

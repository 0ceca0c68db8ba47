//! Scraper facade module.
//!
//! This module provides the main entry point for scraping app metadata.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EngineScraper`] | One scrape per call, one connection per scrape |
//! | [`EngineScraperBuilder`] | Fluent configuration builder |
//! | [`ScraperOptions`] | Endpoint, deadline and fatal notifications |
//! | [`AppMetadata`] | All standard kinds of one app |
//!
//! # Example
//!
//! ```no_run
//! use qlik_engine_scraper::{EngineScraper, Result};
//!
//! # async fn example() -> Result<()> {
//! let scraper = EngineScraper::builder()
//!     .server("https://qlik.example.com")
//!     .build()?;
//!
//! let metadata = scraper.scrape_app("0b9c7e4a-1111-2222-3333-444455556666").await?;
//! println!("{} sheets", metadata.sheets.len());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for scraper configuration.
pub mod builder;

/// Core scraper implementation.
pub mod core;

/// Endpoint and scrape options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::EngineScraperBuilder;
pub use self::core::{AppMetadata, EngineScraper};
pub use options::{DEFAULT_SCRAPE_TIMEOUT, ScraperOptions};

//! Scraper facade.
//!
//! The [`EngineScraper`] runs one scrape per call: it opens a connection to
//! the app, runs the receiver and the workflow engine concurrently under one
//! deadline, and returns the harvested property payloads.
//!
//! # Example
//!
//! ```no_run
//! use qlik_engine_scraper::EngineScraper;
//!
//! # async fn example() -> qlik_engine_scraper::Result<()> {
//! let scraper = EngineScraper::builder()
//!     .server("https://qlik.example.com")
//!     .session_cookie("X-Qlik-Session", "0f3c...")
//!     .build()?;
//!
//! let measures = scraper.get_measures("0b9c7e4a-1111-2222-3333-444455556666").await?;
//! for measure in &measures {
//!     println!("{}", measure["qInfo"]["qId"]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Outcomes
//!
//! | Outcome | Result |
//! |---------|--------|
//! | Workflow settled | `Ok(results)` |
//! | Deadline expired | `Ok(vec![])`, logged at warning |
//! | Fatal notification | `Err(Error::FatalNotification)` |
//! | App missing or denied | `Err(Error::Engine)` |
//! | Engine hung up early | `Err(Error::ConnectionClosed)` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::engine::{ObjectKind, Receiver, SessionState, SessionTracker, Workflow, WorkflowEngine};
use crate::error::Result;
use crate::transport::{Authenticator, Connection};

use super::builder::EngineScraperBuilder;
use super::options::ScraperOptions;

// ============================================================================
// Types
// ============================================================================

/// Shared state of a scraper and its clones.
pub(crate) struct ScraperInner {
    /// Endpoint and scrape behaviour.
    pub options: ScraperOptions,

    /// Session cookie source, consulted once per connection.
    pub authenticator: Arc<dyn Authenticator>,
}

/// Every standard object kind of one app.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppMetadata {
    /// Master dimension properties.
    pub dimensions: Vec<Value>,
    /// Master measure properties.
    pub measures: Vec<Value>,
    /// Sheet properties.
    pub sheets: Vec<Value>,
    /// Master visualization properties.
    pub visualizations: Vec<Value>,
}

impl AppMetadata {
    /// Results for one kind.
    #[must_use]
    pub fn get(&self, kind: ObjectKind) -> &[Value] {
        match kind {
            ObjectKind::Dimension => &self.dimensions,
            ObjectKind::Measure => &self.measures,
            ObjectKind::Sheet => &self.sheets,
            ObjectKind::Visualization => &self.visualizations,
        }
    }

    /// Total number of harvested objects.
    #[must_use]
    pub fn len(&self) -> usize {
        ObjectKind::ALL.iter().map(|kind| self.get(*kind).len()).sum()
    }

    /// Returns `true` if no kind produced any result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// EngineScraper
// ============================================================================

/// Metadata scraper for apps served by a Qlik Engine.
///
/// Cheap to clone; clones share options and credentials. Each scrape opens
/// its own connection, so concurrent scrapes are independent.
#[derive(Clone)]
pub struct EngineScraper {
    /// Shared inner state.
    pub(crate) inner: Arc<ScraperInner>,
}

// ============================================================================
// EngineScraper - Display
// ============================================================================

impl fmt::Debug for EngineScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineScraper")
            .field("server", &self.inner.options.server.as_str())
            .field("virtual_proxy", &self.inner.options.virtual_proxy)
            .field("timeout", &self.inner.options.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EngineScraper - Public API
// ============================================================================

impl EngineScraper {
    /// Creates a configuration builder for the scraper.
    #[inline]
    #[must_use]
    pub fn builder() -> EngineScraperBuilder {
        EngineScraperBuilder::new()
    }

    /// Creates a scraper from validated options.
    pub(crate) fn new(options: ScraperOptions, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            inner: Arc::new(ScraperInner {
                options,
                authenticator,
            }),
        }
    }

    /// Returns the scraper options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ScraperOptions {
        &self.inner.options
    }

    /// Scrapes master dimensions of `app_id`.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn get_dimensions(&self, app_id: &str) -> Result<Vec<Value>> {
        self.scrape(app_id, ObjectKind::Dimension).await
    }

    /// Scrapes master measures of `app_id`.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn get_measures(&self, app_id: &str) -> Result<Vec<Value>> {
        self.scrape(app_id, ObjectKind::Measure).await
    }

    /// Scrapes sheets of `app_id`.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn get_sheets(&self, app_id: &str) -> Result<Vec<Value>> {
        self.scrape(app_id, ObjectKind::Sheet).await
    }

    /// Scrapes master visualizations of `app_id`.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn get_visualizations(&self, app_id: &str) -> Result<Vec<Value>> {
        self.scrape(app_id, ObjectKind::Visualization).await
    }

    /// Scrapes one standard kind with the configured deadline.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn scrape(&self, app_id: &str, kind: ObjectKind) -> Result<Vec<Value>> {
        self.scrape_workflow(app_id, &kind.workflow()).await
    }

    /// Scrapes a custom workflow with the configured deadline.
    ///
    /// # Errors
    ///
    /// See [`scrape_with_timeout`](Self::scrape_with_timeout).
    pub async fn scrape_workflow(&self, app_id: &str, workflow: &Workflow) -> Result<Vec<Value>> {
        self.scrape_with_timeout(app_id, workflow, self.inner.options.timeout)
            .await
    }

    /// Scrapes `workflow` from `app_id` under `deadline`.
    ///
    /// The deadline covers the handshake and the whole conversation. When it
    /// expires the connection is dropped, partial results are discarded and
    /// an empty list is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`](crate::Error::Authentication) if the
    ///   authenticator fails or yields an unusable cookie
    /// - [`Error::Connection`](crate::Error::Connection) if the handshake fails
    /// - [`Error::FatalNotification`](crate::Error::FatalNotification) if the
    ///   engine pushes a fatal notification
    /// - [`Error::Engine`](crate::Error::Engine) if the engine rejects
    ///   `OpenDoc` or `GetAllInfos`
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the
    ///   engine closes the socket with work outstanding
    pub async fn scrape_with_timeout(
        &self,
        app_id: &str,
        workflow: &Workflow,
        deadline: Duration,
    ) -> Result<Vec<Value>> {
        let started = Instant::now();
        let kind = workflow.target_type();
        let mut tracker = SessionTracker::new();

        info!(app_id, kind, timeout = ?deadline, "Scrape started");

        let outcome = timeout(deadline, self.run_session(app_id, workflow, &mut tracker)).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(results)) => {
                info!(app_id, kind, count = results.len(), ?elapsed, "Scrape finished");
                Ok(results)
            }

            Ok(Err(e)) => {
                tracker.transition(SessionState::Errored);
                warn!(app_id, kind, error = %e, ?elapsed, "Scrape failed");
                Err(e)
            }

            Err(_) => {
                let reached = tracker.state();
                tracker.transition(SessionState::TimedOut);
                warn!(
                    app_id,
                    kind,
                    state = %reached,
                    progress = ?tracker.progress(),
                    ?elapsed,
                    "Scrape timed out; returning no results"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Scrapes every standard kind of `app_id` concurrently.
    ///
    /// Each kind runs on its own connection under its own deadline.
    ///
    /// # Errors
    ///
    /// Returns the first error of any kind; the other scrapes are dropped.
    pub async fn scrape_app(&self, app_id: &str) -> Result<AppMetadata> {
        let (dimensions, measures, sheets, visualizations) = tokio::try_join!(
            self.get_dimensions(app_id),
            self.get_measures(app_id),
            self.get_sheets(app_id),
            self.get_visualizations(app_id),
        )?;

        Ok(AppMetadata {
            dimensions,
            measures,
            sheets,
            visualizations,
        })
    }
}

// ============================================================================
// EngineScraper - Session
// ============================================================================

impl EngineScraper {
    /// Opens a connection and drives one workflow over it.
    async fn run_session(
        &self,
        app_id: &str,
        workflow: &Workflow,
        tracker: &mut SessionTracker,
    ) -> Result<Vec<Value>> {
        let options = &self.inner.options;
        let cookie = self.inner.authenticator.session_cookie().await?;

        let connection = Connection::open(&options.app_url(app_id), cookie.as_deref()).await?;
        let (writer, reader) = connection.split();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        let receiver = Receiver::new(reader, replies_tx, &options.fatal_notifications);
        let engine = WorkflowEngine::new(app_id, workflow, writer, replies_rx);

        let ((), results) = tokio::try_join!(receiver.run(), engine.run(tracker))?;
        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Outbound side of a scrape session: the workflow engine.
//!
//! The engine owns the [`CorrelationTable`] and the writer half of the
//! connection. It sends `OpenDoc`, then loops:
//!
//! 1. Stop (closing the socket) once nothing is pending and nothing is queued.
//! 2. If no reply is queued, wait for the receiver to forward one, then
//!    drain whatever else already arrived.
//! 3. Otherwise dispatch every queued reply to its workflow step; each step
//!    registers the ids it sends before returning.
//!
//! Failures of the document-level steps (`OpenDoc`, `GetAllInfos`) end the
//! session with an error. Failures of a single item only drop that item.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Method, Reply, Request};
use crate::transport::ConnectionWriter;

use super::correlation::{CorrelationTable, Disposition, FollowUp, Resolution};
use super::state::{SessionState, SessionTracker};
use super::workflow::{DOC_HANDLE, Workflow};

// ============================================================================
// WorkflowEngine
// ============================================================================

/// Drives one app session through a [`Workflow`].
pub struct WorkflowEngine<'a> {
    app_id: &'a str,
    workflow: &'a Workflow,
    writer: ConnectionWriter,
    replies: mpsc::UnboundedReceiver<Reply>,
    table: CorrelationTable,
}

impl<'a> WorkflowEngine<'a> {
    /// Creates an engine consuming replies from `replies`.
    #[must_use]
    pub fn new(
        app_id: &'a str,
        workflow: &'a Workflow,
        writer: ConnectionWriter,
        replies: mpsc::UnboundedReceiver<Reply>,
    ) -> Self {
        Self {
            app_id,
            workflow,
            writer,
            replies,
            table: CorrelationTable::new(),
        }
    }

    /// Runs the workflow to completion and returns the harvested payloads.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the receiver stops while work is
    ///   outstanding
    /// - [`Error::Engine`] if the engine rejects `OpenDoc` or `GetAllInfos`
    /// - [`Error::Protocol`] if the document or inventory reply lacks the
    ///   document handle or `qInfos`
    /// - [`Error::WebSocket`] or [`Error::Json`] if a request cannot be sent
    pub async fn run(mut self, tracker: &mut SessionTracker) -> Result<Vec<Value>> {
        self.open_document(tracker).await?;

        while !self.table.is_settled() {
            if self.table.unhandled_len() == 0 {
                let Some(reply) = self.replies.recv().await else {
                    return Err(Error::connection_closed(
                        self.table.pending_len(),
                        self.table.unhandled_len(),
                    ));
                };
                self.accept(reply, tracker)?;

                while let Ok(reply) = self.replies.try_recv() {
                    self.accept(reply, tracker)?;
                }
                continue;
            }

            for follow_up in self.table.take_unhandled() {
                self.dispatch(follow_up, tracker).await?;
            }
        }

        if let Err(e) = self.writer.close().await {
            debug!(error = %e, "Close frame not delivered");
        }
        tracker.transition(SessionState::Closed);

        debug!(
            app_id = self.app_id,
            requests = self.writer.ids_issued(),
            results = self.table.results().len(),
            "Workflow complete"
        );
        Ok(self.table.into_results())
    }

    // ========================================================================
    // Reply intake
    // ========================================================================

    /// Resolves one forwarded reply against the table.
    ///
    /// Engine errors on document-level steps are returned; other failed
    /// replies were already logged by the table and are dropped.
    fn accept(&mut self, reply: Reply, tracker: &mut SessionTracker) -> Result<()> {
        let request_id = reply.id;

        match self.table.resolve(reply) {
            Resolution::Harvested(count) => {
                tracker.progress_mut().properties_received += 1;
                debug!(%request_id, count, "Properties harvested");
            }
            Resolution::Queued(method) => {
                debug!(%request_id, %method, "Reply queued");
            }
            Resolution::Failed {
                method: Some(method @ (Method::OpenDoc | Method::GetAllInfos)),
                error,
            } => {
                return Err(Error::engine(method.as_str(), error.code, error.message));
            }
            Resolution::Ignored
            | Resolution::Failed { .. }
            | Resolution::Malformed
            | Resolution::Unknown => {}
        }

        Ok(())
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Registers `request` and writes it.
    async fn send(&mut self, request: Request, disposition: Disposition) -> Result<RequestId> {
        let request_id = request.id;
        self.table.register(request_id, disposition)?;

        if let Err(e) = self.writer.send(&request).await {
            self.table.forget(request_id);
            return Err(e);
        }

        Ok(request_id)
    }

    // ========================================================================
    // Workflow steps
    // ========================================================================

    /// Sends `OpenDoc` for the app.
    async fn open_document(&mut self, tracker: &mut SessionTracker) -> Result<()> {
        let request = Request::open_doc(self.writer.next_id(), self.app_id);
        self.send(request, Disposition::AwaitFollowUp(Method::OpenDoc))
            .await?;

        tracker.transition(SessionState::DocOpenSent);
        Ok(())
    }

    /// Routes a queued reply to the step for its method.
    async fn dispatch(&mut self, follow_up: FollowUp, tracker: &mut SessionTracker) -> Result<()> {
        let FollowUp { method, reply } = follow_up;

        match method {
            Method::OpenDoc => self.on_document_opened(reply, tracker).await,
            Method::GetAllInfos => self.on_inventory(reply, tracker).await,
            m if m == self.workflow.open_method() => self.on_object_opened(reply, tracker).await,
            other => {
                warn!(request_id = %reply.id, method = %other, "No workflow step for reply");
                Ok(())
            }
        }
    }

    /// `OpenDoc` answered: remember the document and list its inventory.
    async fn on_document_opened(&mut self, reply: Reply, tracker: &mut SessionTracker) -> Result<()> {
        let Some(doc) = reply.returned_handle() else {
            return Err(Error::protocol(format!(
                "OpenDoc reply {} for app {:?} carries no document handle",
                reply.id, self.app_id
            )));
        };

        if !self.table.handles_mut().register(DOC_HANDLE, doc) {
            warn!(request_id = %reply.id, %doc, "Document handle already registered");
            return Ok(());
        }
        tracker.transition(SessionState::DocOpened);
        debug!(app_id = self.app_id, handle = %doc, "Document opened");

        let request = Request::get_all_infos(self.writer.next_id(), doc);
        self.send(request, Disposition::AwaitFollowUp(Method::GetAllInfos))
            .await?;

        tracker.transition(SessionState::InventoryRequested);
        Ok(())
    }

    /// `GetAllInfos` answered: open every matching item.
    async fn on_inventory(&mut self, reply: Reply, tracker: &mut SessionTracker) -> Result<()> {
        let Some(doc) = self.table.handles().get(DOC_HANDLE) else {
            return Err(Error::protocol(format!(
                "GetAllInfos reply {} arrived before the document handle",
                reply.id
            )));
        };

        let Some(entries) = self.workflow.select(&reply) else {
            return Err(Error::protocol(format!(
                "GetAllInfos reply {} carries no qInfos",
                reply.id
            )));
        };

        tracker.transition(SessionState::InventoryReceived {
            fan_out: entries.len(),
        });
        debug!(
            app_id = self.app_id,
            target = self.workflow.target_type(),
            count = entries.len(),
            "Inventory filtered"
        );

        let open_method = self.workflow.open_method();
        for entry in entries {
            let request = Request::open_object(self.writer.next_id(), doc, open_method, &entry.id);
            self.send(request, Disposition::AwaitFollowUp(open_method))
                .await?;
            tracker.progress_mut().objects_requested += 1;
        }

        Ok(())
    }

    /// Item opened: fetch its properties.
    async fn on_object_opened(&mut self, reply: Reply, tracker: &mut SessionTracker) -> Result<()> {
        let Some(object) = reply.returned_handle() else {
            warn!(request_id = %reply.id, "Open reply without handle");
            return Ok(());
        };
        tracker.progress_mut().objects_opened += 1;

        let request = Request::get_properties(self.writer.next_id(), object);
        let disposition = Disposition::AwaitResult(self.workflow.result_path().clone());
        self.send(request, disposition).await?;
        tracker.progress_mut().properties_requested += 1;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

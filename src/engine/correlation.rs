//! Correlation table for one connection.
//!
//! Tracks every request that has been sent but not answered, what to do
//! with its reply, the handles the workflow needs to remember, the replies
//! waiting for the workflow engine, and the harvested results.
//!
//! The table is owned by the workflow engine alone; the receiver hands
//! replies over through a channel instead of touching it.
//!
//! # Invariants
//!
//! - A request id is registered before its frame is written.
//! - Each pending id is removed exactly once, by the reply that carries it.
//! - A registered id is never registered again.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::{Handle, RequestId};
use crate::protocol::{EngineError, Method, Reply, ResultPath};

// ============================================================================
// Disposition
// ============================================================================

/// What to do with the reply to a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Drop the reply.
    Ignore,
    /// Queue the reply for the workflow step handling `Method`.
    AwaitFollowUp(Method),
    /// Harvest the payload at the path into the results.
    AwaitResult(ResultPath),
}

// ============================================================================
// FollowUp
// ============================================================================

/// A reply waiting for the workflow engine, tagged with its request method.
#[derive(Debug, Clone)]
pub struct FollowUp {
    /// Method of the request this reply answers.
    pub method: Method,
    /// The reply itself.
    pub reply: Reply,
}

// ============================================================================
// Resolution
// ============================================================================

/// What [`CorrelationTable::resolve`] did with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reply to an `Ignore` request; dropped.
    Ignored,
    /// Queued for the workflow step of this method.
    Queued(Method),
    /// Harvested this many payloads.
    Harvested(usize),
    /// Engine answered with an error; nothing harvested.
    Failed {
        /// Workflow step the reply was awaited for, if any.
        method: Option<Method>,
        /// The engine error.
        error: EngineError,
    },
    /// Harvest path missing from the reply; nothing harvested.
    Malformed,
    /// No pending request has this id.
    Unknown,
}

// ============================================================================
// HandleRegistry
// ============================================================================

/// Named handles remembered across workflow steps (e.g. `doc-handle`).
#[derive(Debug, Default)]
pub struct HandleRegistry {
    handles: FxHashMap<String, Handle>,
}

impl HandleRegistry {
    /// Stores `handle` under `name`.
    ///
    /// Returns `false`, leaving the first value in place, if `name` was
    /// already registered.
    pub fn register(&mut self, name: &str, handle: Handle) -> bool {
        if self.handles.contains_key(name) {
            return false;
        }
        self.handles.insert(name.to_owned(), handle);
        true
    }

    /// Returns the handle stored under `name`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Handle> {
        self.handles.get(name).copied()
    }
}

// ============================================================================
// CorrelationTable
// ============================================================================

/// Pending calls, named handles, unhandled replies and results of one
/// connection.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: FxHashMap<RequestId, Disposition>,
    handles: HandleRegistry,
    unhandled: VecDeque<FollowUp>,
    results: Vec<Value>,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as pending with the given disposition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `id` is already pending.
    pub fn register(&mut self, id: RequestId, disposition: Disposition) -> Result<()> {
        if self.pending.contains_key(&id) {
            return Err(Error::duplicate_request(id));
        }

        debug!(request_id = %id, ?disposition, "Request registered");
        self.pending.insert(id, disposition);
        Ok(())
    }

    /// Drops a pending id whose frame never left.
    pub fn forget(&mut self, id: RequestId) -> Option<Disposition> {
        self.pending.remove(&id)
    }

    /// Consumes a reply according to its pending disposition.
    ///
    /// The id is removed from the pending set whatever the outcome.
    pub fn resolve(&mut self, reply: Reply) -> Resolution {
        let Some(disposition) = self.pending.remove(&reply.id) else {
            warn!(request_id = %reply.id, "Reply for unknown request");
            return Resolution::Unknown;
        };

        if let Some(error) = reply.error() {
            warn!(
                request_id = %reply.id,
                code = error.code,
                message = %error.message,
                "Engine returned an error"
            );
            let method = match disposition {
                Disposition::AwaitFollowUp(method) => Some(method),
                Disposition::Ignore | Disposition::AwaitResult(_) => None,
            };
            return Resolution::Failed { method, error };
        }

        match disposition {
            Disposition::Ignore => Resolution::Ignored,

            Disposition::AwaitFollowUp(method) => {
                self.unhandled.push_back(FollowUp { method, reply });
                Resolution::Queued(method)
            }

            Disposition::AwaitResult(path) => match path.harvest(reply.frame()) {
                Some(items) => {
                    let count = items.len();
                    self.results.extend(items);
                    Resolution::Harvested(count)
                }
                None => {
                    warn!(request_id = %reply.id, %path, "Reply has nothing at result path");
                    Resolution::Malformed
                }
            },
        }
    }

    /// Takes every queued reply, oldest first.
    #[must_use]
    pub fn take_unhandled(&mut self) -> VecDeque<FollowUp> {
        std::mem::take(&mut self.unhandled)
    }

    /// Number of requests awaiting a reply.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of replies awaiting the workflow engine.
    #[inline]
    #[must_use]
    pub fn unhandled_len(&self) -> usize {
        self.unhandled.len()
    }

    /// Returns `true` if `id` awaits a reply.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Returns `true` once nothing is pending and nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.unhandled.is_empty()
    }

    /// Named handles.
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// Named handles, mutably.
    #[inline]
    pub fn handles_mut(&mut self) -> &mut HandleRegistry {
        &mut self.handles
    }

    /// Results harvested so far.
    #[inline]
    #[must_use]
    pub fn results(&self) -> &[Value] {
        &self.results
    }

    /// Consumes the table, returning the harvested results.
    #[must_use]
    pub fn into_results(self) -> Vec<Value> {
        self.results
    }
}

// ============================================================================
// Tests
// ============================================================================

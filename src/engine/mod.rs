//! Conversation engine for one Engine API session.
//!
//! One scrape runs two futures over one connection:
//!
//! ```text
//!   socket ──► Receiver ──(mpsc: Reply)──► WorkflowEngine ──► socket
//!                 │                              │
//!                 └─ fatal notification ─► Err   └─ owns CorrelationTable
//! ```
//!
//! The workflow engine is the only owner of the correlation table, so no
//! locking is involved. It finishes, closing the socket, once no request is
//! pending and no reply is queued.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `correlation` | Pending calls, handles, queued replies, results |
//! | `driver` | [`WorkflowEngine`] main loop and workflow steps |
//! | `receiver` | [`Receiver`] frame classification |
//! | `state` | Session state machine |
//! | `workflow` | [`ObjectKind`] and [`Workflow`] definitions |

// ============================================================================
// Submodules
// ============================================================================

/// Correlation table.
pub mod correlation;

/// Workflow engine main loop.
pub mod driver;

/// Inbound frame handling.
pub mod receiver;

/// Session state tracking.
pub mod state;

/// Workflow definitions.
pub mod workflow;

// ============================================================================
// Re-exports
// ============================================================================

pub use correlation::{CorrelationTable, Disposition, FollowUp, HandleRegistry, Resolution};
pub use driver::WorkflowEngine;
pub use receiver::Receiver;
pub use state::{Progress, SessionState, SessionTracker};
pub use workflow::{DOC_HANDLE, InventoryEntry, ObjectKind, Workflow, object_id};

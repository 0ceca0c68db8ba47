//! Session state of one scrape.
//!
//! ```text
//! Init → DocOpenSent → DocOpened → InventoryRequested → InventoryReceived(N)
//!      → {ObjectOpenSent → ObjectOpened → PropertiesRequested → PropertiesReceived}×N
//!      → Closed | TimedOut | Errored
//! ```
//!
//! The per-item states run concurrently, so they are tracked as counters in
//! [`Progress`] rather than as one state value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::debug;

// ============================================================================
// SessionState
// ============================================================================

/// Document-level state of a scrape session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet.
    Init,
    /// `OpenDoc` sent.
    DocOpenSent,
    /// Document handle received.
    DocOpened,
    /// `GetAllInfos` sent.
    InventoryRequested,
    /// Inventory received; `fan_out` items matched.
    InventoryReceived {
        /// Number of matching items.
        fan_out: usize,
    },
    /// All work done and socket closed.
    Closed,
    /// Deadline expired.
    TimedOut,
    /// Aborted by an error.
    Errored,
}

impl SessionState {
    /// Returns `true` for `Closed`, `TimedOut` and `Errored`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::TimedOut | Self::Errored)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("Init"),
            Self::DocOpenSent => f.write_str("DocOpenSent"),
            Self::DocOpened => f.write_str("DocOpened"),
            Self::InventoryRequested => f.write_str("InventoryRequested"),
            Self::InventoryReceived { fan_out } => write!(f, "InventoryReceived({fan_out})"),
            Self::Closed => f.write_str("Closed"),
            Self::TimedOut => f.write_str("TimedOut"),
            Self::Errored => f.write_str("Errored"),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Per-item counters of the fan-out phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Open calls sent.
    pub objects_requested: usize,
    /// Open calls answered with a handle.
    pub objects_opened: usize,
    /// `GetProperties` calls sent.
    pub properties_requested: usize,
    /// `GetProperties` replies harvested.
    pub properties_received: usize,
}

// ============================================================================
// SessionTracker
// ============================================================================

/// State and progress of one scrape, owned by the facade.
#[derive(Debug)]
pub struct SessionTracker {
    state: SessionState,
    progress: Progress,
}

impl SessionTracker {
    /// Creates a tracker in `Init`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Init,
            progress: Progress {
                objects_requested: 0,
                objects_opened: 0,
                properties_requested: 0,
                properties_received: 0,
            },
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current per-item counters.
    #[inline]
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Per-item counters, mutably.
    #[inline]
    pub fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }

    /// Moves to `next`. Terminal states are final.
    pub fn transition(&mut self, next: SessionState) {
        if self.state.is_terminal() {
            debug!(state = %self.state, ignored = %next, "Session already finished");
            return;
        }

        debug!(from = %self.state, to = %next, "Session state");
        self.state = next;
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

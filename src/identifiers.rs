//! Type-safe identifiers for Engine API entities.
//!
//! Newtype wrappers keep request ids and server handles apart at compile
//! time; both are plain integers on the wire.
//!
//! | Type | Wire type | Issued by |
//! |------|-----------|-----------|
//! | [`RequestId`] | `u64` | Client ([`IdGenerator`]) |
//! | [`Handle`] | `i64` | Engine (`qReturn.qHandle`) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Client-assigned correlation id of one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Server-issued reference to an open object (document, dimension, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(i64);

impl Handle {
    /// Handle used for session-level calls such as `OpenDoc`.
    pub const SESSION: Self = Self(-1);

    /// Wraps a raw handle.
    #[inline]
    #[must_use]
    pub const fn new(handle: i64) -> Self {
        Self(handle)
    }

    /// Returns the raw handle.
    #[inline]
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns `true` for the session-level handle.
    #[inline]
    #[must_use]
    pub const fn is_session(self) -> bool {
        self.0 == Self::SESSION.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// IdGenerator
// ============================================================================

/// Issues strictly increasing request ids, starting at 1.
///
/// One generator lives per connection, so ids are unique for the
/// connection's lifetime. The counter is mutex-guarded so the generator
/// stays correct if it is ever shared across tasks.
#[derive(Debug)]
pub struct IdGenerator {
    last: Mutex<u64>,
}

impl IdGenerator {
    /// Creates a generator whose first id is 1.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Mutex::new(0),
        }
    }

    /// Returns the next id.
    pub fn next_id(&self) -> RequestId {
        let mut last = self.last.lock();
        *last += 1;
        RequestId(*last)
    }

    /// Returns how many ids have been issued.
    #[must_use]
    pub fn issued(&self) -> u64 {
        *self.last.lock()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use proptest::prelude::*;

    #[test]
    fn test_first_id_is_one() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(), RequestId::new(1));
        assert_eq!(ids.next_id(), RequestId::new(2));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_session_handle() {
        assert!(Handle::SESSION.is_session());
        assert_eq!(Handle::SESSION.as_i64(), -1);
        assert!(!Handle::new(1).is_session());
    }

    #[test]
    fn test_serialize_transparent() {
        let json = serde_json::to_string(&RequestId::new(42)).expect("serialize");
        assert_eq!(json, "42");

        let handle: Handle = serde_json::from_str("3").expect("parse");
        assert_eq!(handle, Handle::new(3));
    }

    #[test]
    fn test_concurrent_ids_unique() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread"))
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
        assert_eq!(all.last().copied(), Some(RequestId::new(1000)));
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(rounds in proptest::collection::vec(0usize..20, 1..10)) {
            let ids = IdGenerator::new();
            let mut previous = 0;
            for fan_out in rounds {
                for _ in 0..fan_out {
                    let id = ids.next_id().as_u64();
                    prop_assert!(id > previous);
                    previous = id;
                }
            }
            prop_assert_eq!(ids.issued(), previous);
        }
    }
}

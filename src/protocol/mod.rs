//! Engine API wire types.
//!
//! This module defines the JSON-RPC frames exchanged with the Qlik
//! Associative Engine over one WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Discriminator |
//! |--------------|-----------|---------------|
//! | [`Request`] | Local → Engine | always carries `id` |
//! | [`Reply`] | Engine → Local | `id` present |
//! | [`Notification`] | Engine → Local | `id` absent |
//!
//! Inbound frames are classified exactly once, in [`IncomingMessage::parse`];
//! nothing downstream re-inspects raw JSON to tell replies from
//! notifications.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Inbound [`IncomingMessage`] union |
//! | `method` | Engine API method names |
//! | `path` | Dotted JSON paths into replies |
//! | `request` | Outbound [`Request`] frames |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound message types.
pub mod message;

/// Engine API method names.
pub mod method;

/// Dotted paths used to pull values out of replies.
pub mod path;

/// Outbound request frames.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{
    EngineError, IncomingMessage, Notification, ON_CONNECTED, ON_MAX_PARALLEL_SESSIONS_EXCEEDED, Reply,
};
pub use method::Method;
pub use path::ResultPath;
pub use request::Request;

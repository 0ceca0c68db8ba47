//! WebSocket transport layer.
//!
//! This module opens and drives the client socket to the Qlik Engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Scrape (Rust)  │                              │  Qlik Engine    │
//! │                 │         WebSocket            │                 │
//! │  Writer ────────┼─────────────────────────────►│  /app/{appId}   │
//! │  Reader ◄───────┼──────────────────────────────│                 │
//! └─────────────────┘     Cookie: X-Qlik-Session   └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `auth` | Session cookie seam for the handshake |
//! | `connection` | Socket, id generator, reader/writer halves |

// ============================================================================
// Submodules
// ============================================================================

/// Session credentials for the handshake.
pub mod auth;

/// WebSocket connection to one app session.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{Authenticator, NoAuthentication, SessionCookie};
pub use connection::{Connection, ConnectionReader, ConnectionWriter};

//! WebSocket transport layer.
//!
//! This module owns the one socket shared by every domain controller:
//! command ids, outbound framing, inbound classification and reply
//! correlation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Controllers     │                              │  Peer           │
//! │  (Debugger, ...) │         WebSocket            │  (inspector or  │
//! │        │         │◄────────────────────────────►│   relay proxy)  │
//! │    Transport     │                              │                 │
//! │        │         │                              │                 │
//! │    TopicBus      │                              │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` (or `PendingServer::accept` for reverse connect)
//! 2. `Socket.open` is published
//! 3. `Transport::wait_ready` - Wait for the handshake event
//! 4. `Transport::request` - Send commands, await correlated replies
//! 5. `Transport::close` - Close; outstanding commands are rejected
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Timeouts, handshake event, pending ceiling |
//! | `connection` | Transport handle and event loop |
//! | `pending` | Futures for outstanding commands |
//! | `server` | Reverse-connect listener |

// ============================================================================
// Submodules
// ============================================================================

/// Transport configuration.
pub mod config;

/// Transport handle and event loop.
pub mod connection;

/// Futures for outstanding commands.
pub mod pending;

/// Reverse-connect listener.
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::TransportConfig;
pub use connection::{LinkState, SOCKET_CLOSE, SOCKET_ERROR, SOCKET_OPEN, Transport};
pub use pending::{PendingReply, TypedReply};
pub use server::PendingServer;

//! WebSocket protocol message types.
//!
//! This module defines the DevTools-shaped message format exchanged with
//! the peer, plus the catalogue of known domains.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `CommandFrame` | Local → Peer | Command with correlation id |
//! | `Reply` | Peer → Local | `result` or `error` for one id |
//! | `EventFrame` | Peer → Local | Unsolicited notification |
//!
//! # Method Naming
//!
//! Commands and events follow `Domain.name` format:
//!
//! - `Debugger.setBreakpointByUrl`
//! - `Runtime.evaluate`
//! - `Debugger.paused` (event)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `catalogue` | Per-domain command and event names |
//! | `event` | Typed view of common events |
//! | `frame` | Frame types and inbound classification |

// ============================================================================
// Submodules
// ============================================================================

/// Per-domain command and event names.
pub mod catalogue;

/// Typed event views.
pub mod event;

/// Frame types and classification.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalogue::{Catalogue, CommandGroup, DomainSpec};
pub use event::ParsedEvent;
pub use frame::{CommandFrame, EventFrame, Frame, FrameError, Reply, ReplyError};

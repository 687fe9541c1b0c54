//! DevTools mux - one WebSocket, many protocol domains.
//!
//! This library shares a single DevTools-protocol WebSocket between
//! several independent domain controllers (Debugger, Runtime, Console,
//! Profiler, HeapProfiler, Schema). Each controller issues commands and
//! receives replies and unsolicited events over the same socket.
//!
//! # Architecture
//!
//! Components, leaves first:
//!
//! - **Topic bus**: pattern-matched publish/subscribe with per-callback
//!   panic isolation
//! - **Transport**: owns the socket, allocates command ids, classifies
//!   inbound frames and publishes them on the bus
//! - **Domain controllers**: typed facades that send `<Domain>.<command>`
//!   frames and fan `<Domain>.<event>` topics out to handlers
//! - **Registry**: builds one controller per domain over one transport
//!
//! Replies are correlated by id, never by arrival order.
//!
//! # Quick Start
//!
//! ```no_run
//! use devtools_mux::{Controllers, Result, TransportConfig};
//! use devtools_mux::domain::EvaluateOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let controllers =
//!         Controllers::connect("ws://127.0.0.1:9229/session", TransportConfig::default()).await?;
//!
//!     // The peer announces readiness with a handshake event.
//!     controllers.wait_ready().await?;
//!
//!     controllers.debugger().on("paused", |params| {
//!         println!("paused: {}", params["reason"]);
//!     });
//!     controllers.debugger().enable().await?;
//!
//!     let result = controllers
//!         .runtime()
//!         .evaluate("6 * 7", &EvaluateOptions::new().return_by_value(true))
//!         .await?;
//!     println!("{:?}", result.result.value);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bus`] | [`TopicBus`] and [`TopicPattern`] |
//! | [`domain`] | Domain facades and the [`Controllers`] registry |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire frames and the domain catalogue |
//! | [`transport`] | WebSocket transport and reply futures |

// ============================================================================
// Modules
// ============================================================================

/// Topic bus: pattern-matched publish/subscribe.
pub mod bus;

/// Domain controllers and registry.
///
/// Use [`Controllers::new`] to build every builtin facade over one transport.
pub mod domain;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Wire frames, typed events and the domain catalogue.
pub mod protocol;

/// WebSocket transport layer.
///
/// Owns the socket, the id counter and reply correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bus types
pub use bus::{Callback, TopicBus, TopicPattern};

// Domain types
pub use domain::{
    Console, Controllers, Debugger, DomainController, EventStream, HeapProfiler, Profiler,
    Runtime, Schema,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, HandlerId, SubscriptionId};

// Protocol types
pub use protocol::{Catalogue, DomainSpec, ParsedEvent};

// Transport types
pub use transport::{LinkState, PendingReply, PendingServer, Transport, TransportConfig, TypedReply};

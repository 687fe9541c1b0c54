//! Topic bus: pattern-matched publish/subscribe.
//!
//! The bus routes every inbound frame the transport sees. Subscribers
//! register a [`TopicPattern`] and a callback; `publish` delivers to every
//! subscription whose pattern matches the topic, in registration order.
//!
//! # Topic Families
//!
//! | Topic | Publisher | Publishes |
//! |-------|-----------|-----------|
//! | `response:<id>` | Transport | Exactly one, the reply frame |
//! | `<Domain>.<event>` | Transport | Unbounded, the event params |
//! | `Socket.open` / `Socket.close` / `Socket.error` | Transport | Lifecycle |
//!
//! # Fault Isolation
//!
//! A callback that panics is caught and logged. Delivery continues with
//! the next matching subscription and `publish` never unwinds into the
//! publisher.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `pattern` | Exact and regex topic patterns |
//! | `router` | The [`TopicBus`] itself |

// ============================================================================
// Submodules
// ============================================================================

/// Topic patterns.
pub mod pattern;

/// Subscription list and dispatch.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use pattern::TopicPattern;
pub use router::{Callback, TopicBus};

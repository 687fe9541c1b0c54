//! Subscription list and dispatch.
//!
//! # Delivery Rules
//!
//! - Subscribers matching one publish are invoked in registration order.
//! - The subscription list lock is released before any callback runs, so
//!   callbacks may subscribe or unsubscribe re-entrantly.
//! - A subscription removed by an earlier callback of the same publish is
//!   skipped and not counted. One added during a publish waits for the
//!   next publish.
//! - A panicking callback is counted as notified.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{error, trace};

use crate::identifiers::SubscriptionId;

use super::TopicPattern;

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback, invoked with `(topic, payload)`.
pub type Callback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// One registered subscription.
struct Subscription {
    id: SubscriptionId,
    pattern: TopicPattern,
    callback: Callback,
}

/// Shared state behind every [`TopicBus`] clone.
struct BusInner {
    /// Live subscriptions in registration order.
    subscriptions: RwLock<Vec<Subscription>>,
    /// Next subscription id.
    next_id: AtomicU64,
}

// ============================================================================
// TopicBus
// ============================================================================

/// Publish/subscribe router keyed by pattern-matched string topics.
///
/// Cloning is cheap; clones share one subscription list.
///
/// # Example
///
/// ```
/// use devtools_mux::bus::{TopicBus, TopicPattern};
/// use serde_json::json;
///
/// let bus = TopicBus::new();
/// let id = bus.subscribe(TopicPattern::exact("Debugger.paused"), |topic, payload| {
///     println!("{topic}: {payload}");
/// });
///
/// assert_eq!(bus.publish("Debugger.paused", &json!({"reason": "other"})), 1);
/// assert!(bus.unsubscribe(id));
/// assert_eq!(bus.publish("Debugger.paused", &json!({})), 0);
/// ```
#[derive(Clone)]
pub struct TopicBus {
    inner: Arc<BusInner>,
}

impl Default for TopicBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TopicBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicBus")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl TopicBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscriptions: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a callback for every topic matching `pattern`.
    ///
    /// Identical patterns may be registered any number of times.
    pub fn subscribe<F>(&self, pattern: TopicPattern, callback: F) -> SubscriptionId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.subscribe_callback(pattern, Arc::new(callback))
    }

    /// Registers an already shared callback.
    pub fn subscribe_callback(&self, pattern: TopicPattern, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId::from_raw(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(%id, %pattern, "Subscribed");

        self.inner.subscriptions.write().push(Subscription {
            id,
            pattern,
            callback,
        });

        id
    }

    /// Removes exactly one subscription.
    ///
    /// Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.inner.subscriptions.write();
        match subscriptions.iter().position(|s| s.id == id) {
            Some(index) => {
                subscriptions.remove(index);
                trace!(%id, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Delivers `payload` to every subscription matching `topic`.
    ///
    /// Returns the number of subscribers notified, including those whose
    /// callback panicked. Never panics on behalf of a subscriber.
    pub fn publish(&self, topic: &str, payload: &Value) -> usize {
        let matched: Vec<(SubscriptionId, Callback)> = self
            .inner
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.pattern.matches(topic))
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect();

        let mut notified = 0;

        for (id, callback) in matched {
            if !self.is_subscribed(id) {
                continue;
            }

            notified += 1;

            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(topic, payload))) {
                error!(
                    subscription = %id,
                    topic,
                    panic = panic_message(&*panic),
                    "Subscriber panicked"
                );
            }
        }

        trace!(topic, notified, "Published");
        notified
    }

    /// Returns the subscriptions that would receive a publish on `topic`.
    #[must_use]
    pub fn matching_subscriptions(&self, topic: &str) -> Vec<SubscriptionId> {
        self.inner
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.pattern.matches(topic))
            .map(|s| s.id)
            .collect()
    }

    /// Returns the number of live subscriptions.
    #[inline]
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Returns `true` if the subscription is still registered.
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.subscriptions.read().iter().any(|s| s.id == id)
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}

// ============================================================================
// Tests
// ============================================================================

//! Domain controller base.
//!
//! A [`DomainController`] is the shared machinery behind every facade:
//! it prefixes command names with its domain, sends them through the
//! [`Transport`], and fans `<Domain>.<event>` topics out to locally
//! registered handlers.
//!
//! Each distinct event name costs one bus subscription, created with the
//! first handler and removed with the last.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::bus::TopicPattern;
use crate::bus::router::panic_message;
use crate::identifiers::{HandlerId, SubscriptionId};
use crate::protocol::{Catalogue, ParsedEvent};
use crate::transport::{PendingReply, Transport};

// ============================================================================
// Types
// ============================================================================

/// Handler invoked with an event's params.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handlers registered for one event name.
struct EventSlot {
    subscription: SubscriptionId,
    handlers: Vec<(HandlerId, EventHandler)>,
}

/// Internal shared state for a controller.
struct ControllerInner {
    domain: String,
    transport: Transport,
    catalogue: Arc<Catalogue>,
    listeners: Mutex<FxHashMap<String, EventSlot>>,
}

impl ControllerInner {
    fn method(&self, name: &str) -> String {
        format!("{}.{}", self.domain, name)
    }

    fn has_handler(&self, event: &str, id: HandlerId) -> bool {
        self.listeners
            .lock()
            .get(event)
            .is_some_and(|slot| slot.handlers.iter().any(|(h, _)| *h == id))
    }

    /// Runs every handler for `event`, isolating panics.
    fn dispatch(&self, event: &str, params: &Value) {
        let handlers: Vec<(HandlerId, EventHandler)> = match self.listeners.lock().get(event) {
            Some(slot) => slot
                .handlers
                .iter()
                .map(|(id, handler)| (*id, Arc::clone(handler)))
                .collect(),
            None => return,
        };

        for (id, handler) in handlers {
            if !self.has_handler(event, id) {
                continue;
            }

            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(params))) {
                error!(
                    domain = %self.domain,
                    event,
                    handler = %id,
                    panic = panic_message(&*panic),
                    "Event handler panicked"
                );
            }
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        let bus = self.transport.bus();
        for (_, slot) in self.listeners.get_mut().drain() {
            bus.unsubscribe(slot.subscription);
        }
    }
}

// ============================================================================
// DomainController
// ============================================================================

/// Command sender and event fan-out for one protocol domain.
///
/// Cloning is cheap; clones share handlers. Bus subscriptions are removed
/// when the last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use devtools_mux::{DomainController, Transport, TransportConfig};
/// use serde_json::json;
///
/// # async fn example(transport: Transport) -> devtools_mux::Result<()> {
/// let network = DomainController::new(transport, "Network");
/// network.on("requestWillBeSent", |params| println!("{params}"));
/// network.call("enable", json!({})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DomainController {
    inner: Arc<ControllerInner>,
}

impl fmt::Debug for DomainController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainController")
            .field("domain", &self.inner.domain)
            .field("events", &self.inner.listeners.lock().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DomainController - Constructors
// ============================================================================

impl DomainController {
    /// Creates a controller validated against the builtin catalogue.
    #[must_use]
    pub fn new(transport: Transport, domain: impl Into<String>) -> Self {
        Self::with_catalogue(transport, domain, Arc::new(Catalogue::builtin()))
    }

    /// Creates a controller validated against `catalogue`.
    #[must_use]
    pub fn with_catalogue(
        transport: Transport,
        domain: impl Into<String>,
        catalogue: Arc<Catalogue>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                domain: domain.into(),
                transport,
                catalogue,
                listeners: Mutex::new(FxHashMap::default()),
            }),
        }
    }
}

// ============================================================================
// DomainController - Commands
// ============================================================================

impl DomainController {
    /// Sends `<Domain>.<command>` and returns a future for its reply.
    ///
    /// The frame is sent before this returns. Unknown command names are
    /// logged and sent anyway.
    pub fn call(&self, command: &str, params: Value) -> PendingReply {
        if !self.is_valid_command(command) {
            warn!(domain = %self.inner.domain, command, "Command not in catalogue");
        }

        let method = self.inner.method(command);
        debug!(%method, "Calling");
        self.inner.transport.request(&method, params)
    }

    /// Like [`call`](Self::call), serializing `params` first.
    pub fn call_with<P: Serialize>(&self, command: &str, params: &P) -> PendingReply {
        match serde_json::to_value(params) {
            Ok(params) => self.call(command, params),
            Err(e) => PendingReply::failed(e.into()),
        }
    }
}

// ============================================================================
// DomainController - Events
// ============================================================================

impl DomainController {
    /// Registers a handler for `<Domain>.<event>`.
    ///
    /// The handler receives the event params. Returns an id for [`off`](Self::off).
    pub fn on<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if !self.is_valid_event(event) {
            warn!(domain = %self.inner.domain, event, "Event not in catalogue");
        }

        let id = HandlerId::generate();
        let handler: EventHandler = Arc::new(handler);

        let mut listeners = self.inner.listeners.lock();
        if let Some(slot) = listeners.get_mut(event) {
            slot.handlers.push((id, handler));
            return id;
        }

        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        let name = event.to_string();
        let subscription = self.inner.transport.bus().subscribe(
            TopicPattern::exact(self.inner.method(event)),
            move |_, params| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch(&name, params);
                }
            },
        );

        debug!(domain = %self.inner.domain, event, %subscription, "Listening");
        listeners.insert(
            event.to_string(),
            EventSlot {
                subscription,
                handlers: vec![(id, handler)],
            },
        );

        id
    }

    /// Registers a handler that receives the event as a [`ParsedEvent`].
    pub fn on_parsed<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(ParsedEvent) + Send + Sync + 'static,
    {
        let method = self.inner.method(event);
        self.on(event, move |params| handler(ParsedEvent::parse(&method, params)))
    }

    /// Removes one handler. Returns `false` if it was not registered.
    ///
    /// Removing the last handler for an event drops its bus subscription.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let Some(slot) = listeners.get_mut(event) else {
            return false;
        };

        let before = slot.handlers.len();
        slot.handlers.retain(|(h, _)| *h != id);
        if slot.handlers.len() == before {
            return false;
        }

        if slot.handlers.is_empty()
            && let Some(slot) = listeners.remove(event)
        {
            self.inner.transport.bus().unsubscribe(slot.subscription);
            debug!(domain = %self.inner.domain, event, "Stopped listening");
        }

        true
    }

    /// Returns a stream of params for `<Domain>.<event>`.
    ///
    /// The handler backing the stream is removed when it is dropped.
    pub fn events(&self, event: &str) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = self.on(event, move |params| {
            let _ = tx.send(params.clone());
        });

        EventStream {
            rx,
            event: event.to_string(),
            handler,
            controller: Arc::downgrade(&self.inner),
        }
    }

    /// Returns the number of handlers registered for `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.inner
            .listeners
            .lock()
            .get(event)
            .map_or(0, |slot| slot.handlers.len())
    }
}

// ============================================================================
// DomainController - Accessors
// ============================================================================

impl DomainController {
    /// Returns the domain name.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.inner.domain
    }

    /// Returns the shared transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Returns the catalogue used for validation.
    #[inline]
    #[must_use]
    pub fn catalogue(&self) -> &Catalogue {
        &self.inner.catalogue
    }

    /// Returns `true` if the catalogue lists `command` for this domain.
    #[must_use]
    pub fn is_valid_command(&self, command: &str) -> bool {
        self.inner
            .catalogue
            .is_valid_command(&self.inner.domain, command)
    }

    /// Returns `true` if the catalogue lists `event` for this domain.
    #[must_use]
    pub fn is_valid_event(&self, event: &str) -> bool {
        self.inner.catalogue.is_valid_event(&self.inner.domain, event)
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// Async receiver of one event's params.
///
/// Implements [`Stream`]; [`recv`](Self::recv) is the direct form.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Value>,
    event: String,
    handler: HandlerId,
    controller: Weak<ControllerInner>,
}

impl EventStream {
    /// Waits for the next event. Returns `None` once the controller is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(inner) = self.controller.upgrade() {
            DomainController { inner }.off(&self.event, self.handler);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

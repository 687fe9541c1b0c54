//! WebSocket transport and event loop.
//!
//! The transport owns the single socket shared by every domain
//! controller. It allocates command ids, serializes outbound commands,
//! classifies inbound frames and publishes them on the [`TopicBus`].
//!
//! # Event Loop
//!
//! `connect` spawns a tokio task that handles:
//!
//! - Incoming frames from the peer (replies, events)
//! - Outgoing commands queued by `send`
//! - Lifecycle topics (`Socket.open`, `Socket.error`, `Socket.close`)
//! - Rejecting outstanding commands when the socket goes away
//!
//! # Routing
//!
//! | Inbound frame | Topic | Payload |
//! |---------------|-------|---------|
//! | `{"id": n, ...}` | `response:n` | whole frame |
//! | `{"method": m, ...}` | `m` | `params` |
//! | both or neither | dropped | - |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::bus::{TopicBus, TopicPattern};
use crate::error::{Error, Result};
use crate::identifiers::{CommandId, CommandIdAllocator, SubscriptionId};
use crate::protocol::{CommandFrame, Frame, Reply};

use super::config::millis;
use super::{PendingReply, TransportConfig};

// ============================================================================
// Constants
// ============================================================================

/// Published once the socket is open. Payload: `{"url": ...}`.
pub const SOCKET_OPEN: &str = "Socket.open";

/// Published when the socket closes. Payload: `{"code", "reason"}` or `{}`.
pub const SOCKET_CLOSE: &str = "Socket.close";

/// Published on a socket failure. Payload: `{"message": ...}`.
pub const SOCKET_ERROR: &str = "Socket.error";

/// Settled ids tracked individually above the ledger floor.
const REPLY_WINDOW: usize = 1024;

// ============================================================================
// Types
// ============================================================================

/// One command awaiting its reply.
struct PendingCommand {
    method: String,
    subscription: SubscriptionId,
    reply_tx: oneshot::Sender<Result<Value>>,
}

/// Outstanding commands by id.
type PendingMap = FxHashMap<CommandId, PendingCommand>;

/// Messages for the event loop.
enum Outbound {
    /// Serialized frame to write.
    Frame(String),
    /// Close the socket and stop.
    Close,
}

/// Ids whose reply has been published.
///
/// Every id up to `floor` is settled; later ones are held individually
/// until the floor catches up. When more than [`REPLY_WINDOW`] are held,
/// the floor jumps to the oldest of them, so ids skipped by the jump
/// count as settled.
#[derive(Debug, Default)]
struct ReplyLedger {
    floor: u64,
    above: FxHashSet<u64>,
}

impl ReplyLedger {
    /// Records `id`. Returns `false` if it was already settled.
    fn settle(&mut self, id: CommandId) -> bool {
        let id = id.as_u64();
        if id <= self.floor || !self.above.insert(id) {
            return false;
        }

        self.advance();

        if self.above.len() > REPLY_WINDOW {
            if let Some(oldest) = self.above.iter().min().copied() {
                self.floor = oldest;
                self.above.retain(|&held| held > oldest);
                self.advance();
            }
        }

        true
    }

    fn advance(&mut self) {
        while self.above.remove(&(self.floor + 1)) {
            self.floor += 1;
        }
    }

    /// Number of ids held above the floor.
    fn retained(&self) -> usize {
        self.above.len()
    }
}

/// Connection state as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Never connected.
    Idle,
    /// Socket open, handshake event not seen yet.
    Open,
    /// Handshake event seen; domain commands may be issued.
    Ready,
    /// Socket closed.
    Closed,
}

// ============================================================================
// TransportInner
// ============================================================================

/// State shared by transport handles, pending replies and the event loop.
pub(crate) struct TransportInner {
    bus: TopicBus,
    config: TransportConfig,
    ids: CommandIdAllocator,
    outbound: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
    pending: Mutex<PendingMap>,
    replied: Mutex<ReplyLedger>,
    state: watch::Sender<LinkState>,
}

impl TransportInner {
    /// Completes a pending command from its reply frame.
    fn settle(&self, id: CommandId, frame: &Value) {
        let entry = self.pending.lock().remove(&id);
        let Some(entry) = entry else {
            return;
        };

        self.bus.unsubscribe(entry.subscription);

        let result = Reply::from_value(frame).and_then(|reply| reply.into_result(&entry.method));
        trace!(%id, method = %entry.method, ok = result.is_ok(), "Command settled");

        let _ = entry.reply_tx.send(result);
    }

    /// Abandons a pending command without completing it.
    pub(crate) fn forget(&self, id: CommandId) {
        let entry = self.pending.lock().remove(&id);
        if let Some(entry) = entry {
            self.bus.unsubscribe(entry.subscription);
            debug!(%id, method = %entry.method, "Pending command abandoned");
        }
    }

    /// Classifies one inbound text frame and publishes it.
    fn handle_incoming(&self, text: &str) {
        let frame = match Frame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping inbound frame");
                return;
            }
        };

        match frame {
            Frame::Reply { id, frame } => {
                let awaited = self.pending.lock().contains_key(&id);

                // Ids this transport never allocated are not recorded, so a
                // command issued later under that id still gets its reply.
                if self.ids.issued(id) && !self.replied.lock().settle(id) && !awaited {
                    warn!(%id, "Duplicate reply dropped");
                    return;
                }
                if !awaited {
                    debug!(%id, "Reply without a pending request");
                }

                self.bus.publish(&id.reply_topic(), &frame);
            }

            Frame::Event(event) => {
                if event.method == self.config.handshake_event {
                    self.state.send_if_modified(|state| {
                        if *state == LinkState::Open {
                            *state = LinkState::Ready;
                            true
                        } else {
                            false
                        }
                    });
                    debug!(event = %event.method, "Handshake received");
                }

                trace!(event = %event.method, "Event received");
                self.bus.publish(&event.method, &event.params);
            }
        }
    }

    /// Tears down after the event loop stops.
    fn on_closed(&self, payload: Value) {
        self.outbound.lock().take();
        self.state.send_replace(LinkState::Closed);
        self.bus.publish(SOCKET_CLOSE, &payload);

        if !self.config.fail_pending_on_close {
            return;
        }

        let pending: Vec<_> = self.pending.lock().drain().collect();
        let count = pending.len();

        for (_, entry) in pending {
            self.bus.unsubscribe(entry.subscription);
            let _ = entry.reply_tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending commands on close");
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Owner of the single WebSocket shared by every domain controller.
///
/// Cloning is cheap and clones share the socket, id counter and bus.
///
/// # Example
///
/// ```no_run
/// use devtools_mux::{Transport, TransportConfig};
/// use serde_json::json;
///
/// # async fn example() -> devtools_mux::Result<()> {
/// let transport = Transport::new(TransportConfig::default());
/// transport.connect("ws://127.0.0.1:9229/session").await?;
/// transport.wait_ready().await?;
///
/// let result = transport.request("Runtime.evaluate", json!({"expression": "1+1"})).await?;
/// println!("{result}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish()
    }
}

// ============================================================================
// Transport - Constructors
// ============================================================================

impl Transport {
    /// Creates an unconnected transport with its own topic bus.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self::with_bus(TopicBus::new(), config)
    }

    /// Creates an unconnected transport publishing on `bus`.
    #[must_use]
    pub fn with_bus(bus: TopicBus, config: TransportConfig) -> Self {
        let (state, _) = watch::channel(LinkState::Idle);

        Self {
            inner: Arc::new(TransportInner {
                bus,
                config,
                ids: CommandIdAllocator::new(),
                outbound: Mutex::new(None),
                pending: Mutex::new(PendingMap::default()),
                replied: Mutex::new(ReplyLedger::default()),
                state,
            }),
        }
    }
}

// ============================================================================
// Transport - Connection
// ============================================================================

impl Transport {
    /// Opens the socket and starts the event loop.
    ///
    /// Publishes `Socket.open` on success. Does not wait for the
    /// handshake event; see [`wait_ready`](Self::wait_ready).
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `address` is not a `ws://` or `wss://` URL
    /// - [`Error::AlreadyConnected`] if a socket is already live
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds the timeout
    /// - [`Error::WebSocket`] if the WebSocket handshake fails
    pub async fn connect(&self, address: &str) -> Result<()> {
        let url = Url::parse(address)
            .map_err(|e| Error::config(format!("invalid address `{address}`: {e}")))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "unsupported scheme `{}`, expected ws or wss",
                url.scheme()
            )));
        }

        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let limit = self.inner.config.connect_timeout;
        let (ws_stream, _response) = timeout(limit, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(millis(limit)))??;

        self.connect_stream(ws_stream, url.as_str())
    }

    /// Attaches an already upgraded WebSocket and starts the event loop.
    ///
    /// `label` is reported in the `Socket.open` payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyConnected`] if a socket is already live.
    pub fn connect_stream<S>(&self, ws_stream: WebSocketStream<S>, label: &str) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        {
            let mut outbound = self.inner.outbound.lock();
            if outbound.is_some() {
                return Err(Error::AlreadyConnected);
            }
            *outbound = Some(outbound_tx);
        }

        self.inner.state.send_replace(LinkState::Open);
        info!(url = label, "WebSocket connection established");
        self.inner.bus.publish(SOCKET_OPEN, &json!({ "url": label }));

        tokio::spawn(run_event_loop(
            ws_stream,
            outbound_rx,
            Arc::downgrade(&self.inner),
        ));

        Ok(())
    }

    /// Waits for the peer's handshake event.
    ///
    /// Returns immediately if it already arrived.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if `connect` was never called
    /// - [`Error::ConnectionClosed`] if the socket closes first
    /// - [`Error::ConnectionTimeout`] if the event does not arrive in time
    pub async fn wait_ready(&self) -> Result<()> {
        let mut state = self.inner.state.subscribe();
        let limit = self.inner.config.ready_timeout;

        let settled = timeout(
            limit,
            state.wait_for(|s| matches!(s, LinkState::Idle | LinkState::Ready | LinkState::Closed)),
        )
        .await
        .map_err(|_| Error::connection_timeout(millis(limit)))?
        .map(|s| *s)
        .map_err(|_| Error::ConnectionClosed)?;

        match settled {
            LinkState::Ready => Ok(()),
            LinkState::Idle => Err(Error::NotConnected),
            LinkState::Open | LinkState::Closed => Err(Error::ConnectionClosed),
        }
    }

    /// Closes the socket and waits for the event loop to stop.
    ///
    /// Does nothing if not connected.
    pub async fn close(&self) {
        let sent = self
            .inner
            .outbound
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(Outbound::Close).is_ok());

        if !sent {
            return;
        }

        let mut state = self.inner.state.subscribe();
        let _ = state.wait_for(|s| *s == LinkState::Closed).await;
    }
}

// ============================================================================
// Transport - Commands
// ============================================================================

impl Transport {
    /// Sends a command without waiting for its reply.
    ///
    /// Returns the id immediately. A caller wanting the reply must
    /// subscribe to `response:<id>` itself, or use [`request`](Self::request)
    /// which registers the subscription before sending.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if there is no live socket
    /// - [`Error::Json`] if the frame cannot be serialized
    pub fn send(&self, method: &str, params: Value) -> Result<CommandId> {
        let id = self.inner.ids.next();
        self.enqueue(&CommandFrame::new(id, method, params))?;
        Ok(id)
    }

    /// Sends a command and returns a future for its reply.
    ///
    /// The reply subscription exists before the frame is queued, so a
    /// fast reply cannot be missed. Errors surface when the future is
    /// awaited.
    pub fn request(&self, method: &str, params: Value) -> PendingReply {
        match self.try_request(method, params) {
            Ok(reply) => reply,
            Err(e) => PendingReply::failed(e),
        }
    }

    fn try_request(&self, method: &str, params: Value) -> Result<PendingReply> {
        let max = self.inner.config.max_pending;
        let pending = self.pending_count();
        if pending >= max {
            warn!(pending, max, "Too many pending commands");
            return Err(Error::TooManyPending { pending, max });
        }

        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let id = self.inner.ids.next();
        let (reply_tx, reply_rx) = oneshot::channel();

        let weak = Arc::downgrade(&self.inner);
        let subscription = self.inner.bus.subscribe(
            TopicPattern::exact(id.reply_topic()),
            move |_, frame| {
                if let Some(inner) = weak.upgrade() {
                    inner.settle(id, frame);
                }
            },
        );

        self.inner.pending.lock().insert(
            id,
            PendingCommand {
                method: method.to_string(),
                subscription,
                reply_tx,
            },
        );

        if let Err(e) = self.enqueue(&CommandFrame::new(id, method, params)) {
            self.inner.forget(id);
            return Err(e);
        }

        Ok(PendingReply::waiting(
            id,
            method.to_string(),
            reply_rx,
            self.inner.config.command_timeout,
            Arc::downgrade(&self.inner),
        ))
    }

    /// Serializes a frame and hands it to the event loop.
    fn enqueue(&self, frame: &CommandFrame) -> Result<()> {
        let json = serde_json::to_string(frame)?;

        let outbound = self.inner.outbound.lock();
        let tx = outbound.as_ref().ok_or(Error::NotConnected)?;
        tx.send(Outbound::Frame(json))
            .map_err(|_| Error::NotConnected)?;

        trace!(id = %frame.id, method = %frame.method, "Command queued");
        Ok(())
    }
}

// ============================================================================
// Transport - Accessors
// ============================================================================

impl Transport {
    /// Returns the topic bus this transport publishes on.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &TopicBus {
        &self.inner.bus
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LinkState {
        *self.inner.state.borrow()
    }

    /// Returns `true` while a socket is live.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.outbound.lock().is_some()
    }

    /// Returns `true` once the handshake event has arrived.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == LinkState::Ready
    }

    /// Returns the number of commands awaiting replies.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Drives one socket until it closes or every transport handle is gone.
async fn run_event_loop<S>(
    ws_stream: WebSocketStream<S>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    transport: Weak<TransportInner>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut close_payload = json!({});

    loop {
        tokio::select! {
            // Incoming frames from the peer
            message = ws_read.next() => {
                let Some(inner) = transport.upgrade() else {
                    break;
                };

                match message {
                    Some(Ok(Message::Text(text))) => inner.handle_incoming(&text),

                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => inner.handle_incoming(text),
                        Err(e) => warn!(error = %e, "Dropping non UTF-8 binary frame"),
                    },

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by peer");
                        if let Some(frame) = frame {
                            close_payload = json!({
                                "code": u16::from(frame.code),
                                "reason": frame.reason.as_str(),
                            });
                        }
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        inner.bus.publish(SOCKET_ERROR, &json!({ "message": e.to_string() }));
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Ignore Ping, Pong, raw frames
                    _ => {}
                }
            }

            // Commands queued by the API
            command = outbound_rx.recv() => {
                match command {
                    Some(Outbound::Frame(json)) => {
                        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                            error!(error = %e, "Failed to write frame");
                            if let Some(inner) = transport.upgrade() {
                                inner.bus.publish(SOCKET_ERROR, &json!({ "message": e.to_string() }));
                            }
                            break;
                        }
                    }

                    Some(Outbound::Close) => {
                        debug!("Close requested");
                        let _ = ws_write.close().await;
                        break;
                    }

                    None => {
                        debug!("Transport dropped");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    if let Some(inner) = transport.upgrade() {
        inner.on_closed(close_payload);
    }

    debug!("Event loop terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::transport::testing::{MockPeer, connected_pair};

    #[test]
    fn test_lifecycle_topic_names() {
        assert_eq!(SOCKET_OPEN, "Socket.open");
        assert_eq!(SOCKET_CLOSE, "Socket.close");
        assert_eq!(SOCKET_ERROR, "Socket.error");
    }

    #[test]
    fn test_send_before_connect_fails() {
        let transport = Transport::new(TransportConfig::default());
        assert!(matches!(
            transport.send("Debugger.pause", Value::Null),
            Err(Error::NotConnected)
        ));
        assert_eq!(transport.state(), LinkState::Idle);
    }

    #[tokio::test]
    async fn test_request_before_connect_rejects() {
        let transport = Transport::new(TransportConfig::default());
        let result = transport.request("Debugger.pause", Value::Null).await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(transport.bus().subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_address() {
        let transport = Transport::new(TransportConfig::default());
        assert!(matches!(transport.connect("not a url").await, Err(Error::Config { .. })));
        assert!(matches!(
            transport.connect("http://127.0.0.1:1").await,
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_websocket_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let transport = Transport::new(TransportConfig::default());
        let err = transport.connect(&format!("ws://127.0.0.1:{port}")).await.unwrap_err();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_wait_ready_before_connect() {
        let transport = Transport::new(TransportConfig::default());
        assert!(matches!(transport.wait_ready().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_socket_open_published() {
        let transport = Transport::new(TransportConfig::default());
        let opened = Arc::new(Mutex::new(None));
        {
            let opened = Arc::clone(&opened);
            transport.bus().subscribe(TopicPattern::exact(SOCKET_OPEN), move |_, payload| {
                *opened.lock() = Some(payload.clone());
            });
        }

        let peer = MockPeer::bind().await;
        let url = peer.url();
        let (connected, _socket) = tokio::join!(transport.connect(&url), peer.accept());
        connected.expect("connect");

        let payload = opened.lock().clone().expect("Socket.open published");
        assert_eq!(payload["url"], url);
        assert!(transport.is_connected());
        assert_eq!(transport.state(), LinkState::Open);
    }

    #[tokio::test]
    async fn test_second_connect_rejected() {
        let (transport, peer) = connected_pair(TransportConfig::default()).await;
        let result = transport.connect(&peer.url()).await;
        assert!(matches!(result, Err(Error::AlreadyConnected)));
    }

    #[tokio::test]
    async fn test_send_ids_strictly_increase() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;

        let ids: Vec<CommandId> = (0..5)
            .map(|_| transport.send("Runtime.enable", Value::Null).expect("send"))
            .collect();

        assert_eq!(ids.first().map(CommandId::as_u64), Some(1));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        for expected in &ids {
            let frame = peer.recv_json().await;
            assert_eq!(frame["id"], expected.as_u64());
            assert_eq!(frame["method"], "Runtime.enable");
            assert_eq!(frame["params"], json!({}));
        }
    }

    #[tokio::test]
    async fn test_reply_published_on_response_topic() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));

        let id = transport.send("Debugger.pause", Value::Null).expect("send");
        transport.bus().subscribe(TopicPattern::exact(id.reply_topic()), move |_, frame| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(frame.clone());
            }
        });

        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "result": {"x": 1}})).await;

        let frame = rx.await.expect("published");
        assert_eq!(frame["id"], id.as_u64());
        assert_eq!(frame["result"]["x"], 1);
    }

    #[tokio::test]
    async fn test_event_published_with_params() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));

        transport.bus().subscribe(TopicPattern::exact("Debugger.paused"), move |topic, params| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send((topic.to_string(), params.clone()));
            }
        });

        peer.send_json(json!({"method": "Debugger.paused", "params": {"reason": "breakpoint"}}))
            .await;

        let (topic, params) = rx.await.expect("published");
        assert_eq!(topic, "Debugger.paused");
        assert_eq!(params, json!({"reason": "breakpoint"}));
    }

    #[tokio::test]
    async fn test_request_resolves() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;

        let reply = transport.request("Runtime.evaluate", json!({"expression": "1+1"}));
        let sent = peer.recv_json().await;
        assert_eq!(sent["params"]["expression"], "1+1");

        peer.send_json(json!({"id": sent["id"], "result": {"result": {"value": 2}}})).await;

        let result = reply.await.expect("resolved");
        assert_eq!(result["result"]["value"], 2);
        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.bus().subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_request_error_reply_rejects() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;

        let reply = transport.request("Debugger.pause", Value::Null);
        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "error": {"code": -1, "message": "boom"}}))
            .await;

        let err = reply.await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.command_code(), Some(-1));
    }

    #[tokio::test]
    async fn test_out_of_order_replies_correlate() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;

        let one = transport.request("A.one", Value::Null);
        let two = transport.request("A.two", Value::Null);
        let first = peer.recv_json().await;
        let second = peer.recv_json().await;

        peer.send_json(json!({"id": second["id"], "result": {"name": "two"}})).await;
        peer.send_json(json!({"id": first["id"], "result": {"name": "one"}})).await;

        assert_eq!(one.await.expect("one")["name"], "one");
        assert_eq!(two.await.expect("two")["name"], "two");
    }

    #[tokio::test]
    async fn test_malformed_and_ambiguous_frames_dropped() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            transport.bus().subscribe(TopicPattern::any(), move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        peer.send_text("{not json").await;
        peer.send_json(json!({"id": 1, "method": "Debugger.paused"})).await;
        peer.send_json(json!({"params": {}})).await;

        // Connection survives; a valid frame still flows.
        let reply = transport.request("Runtime.enable", Value::Null);
        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "result": {}})).await;
        reply.await.expect("resolved");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_reply_published_once() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let hits = Arc::new(AtomicUsize::new(0));

        let id = transport.send("A.one", Value::Null).expect("send");
        {
            let hits = Arc::clone(&hits);
            transport.bus().subscribe(TopicPattern::exact(id.reply_topic()), move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "result": {}})).await;
        peer.send_json(json!({"id": sent["id"], "result": {}})).await;

        // A round trip after both replies proves they were processed.
        let reply = transport.request("A.two", Value::Null);
        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "result": {}})).await;
        reply.await.expect("resolved");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reply_for_unissued_id_published() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            transport.bus().subscribe(TopicPattern::exact("response:7"), move |_, frame| {
                assert_eq!(frame["result"]["x"], 1);
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        peer.send_json(json!({"id": 7, "result": {"x": 1}})).await;

        let reply = transport.request("Runtime.enable", Value::Null);
        let sent = peer.recv_json().await;
        peer.send_json(json!({"id": sent["id"], "result": {}})).await;
        reply.await.expect("resolved");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settled_ids_not_retained() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;

        for _ in 0..300 {
            let reply = transport.request("Runtime.enable", Value::Null);
            let sent = peer.recv_json().await;
            peer.send_json(json!({"id": sent["id"], "result": {}})).await;
            reply.await.expect("resolved");
        }

        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.inner.replied.lock().retained(), 0);
    }

    fn id(n: u64) -> CommandId {
        CommandId::new(n).expect("non-zero")
    }

    #[test]
    fn test_reply_ledger_in_order() {
        let mut ledger = ReplyLedger::default();
        for n in 1..=5000 {
            assert!(ledger.settle(id(n)));
        }

        assert_eq!(ledger.retained(), 0);
        assert!(!ledger.settle(id(4999)));
    }

    #[test]
    fn test_reply_ledger_out_of_order() {
        let mut ledger = ReplyLedger::default();

        assert!(ledger.settle(id(3)));
        assert!(ledger.settle(id(1)));
        assert_eq!(ledger.retained(), 1);

        assert!(ledger.settle(id(2)));
        assert_eq!(ledger.retained(), 0);

        assert!(!ledger.settle(id(2)));
        assert!(!ledger.settle(id(3)));
    }

    #[test]
    fn test_reply_ledger_bounded_with_gaps() {
        let mut ledger = ReplyLedger::default();
        for n in (2..=20_000).step_by(2) {
            assert!(ledger.settle(id(n)));
            assert!(ledger.retained() <= REPLY_WINDOW);
        }

        assert!(!ledger.settle(id(2)));
        assert!(!ledger.settle(id(20_000)));
    }

    #[tokio::test]
    async fn test_handshake_marks_ready() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        assert!(!transport.is_ready());

        peer.send_json(json!({"method": "Proxy.ready", "params": {}})).await;
        transport.wait_ready().await.expect("ready");
        assert!(transport.is_ready());

        // Already latched: returns at once.
        transport.wait_ready().await.expect("still ready");
    }

    #[tokio::test]
    async fn test_wait_ready_times_out() {
        let config = TransportConfig::new().with_ready_timeout(Duration::from_millis(50));
        let (transport, _peer) = connected_pair(config).await;

        let err = transport.wait_ready().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 50 }));
    }

    #[tokio::test]
    async fn test_request_timeout_unsubscribes() {
        let config = TransportConfig::new().with_command_timeout(Some(Duration::from_millis(50)));
        let (transport, mut peer) = connected_pair(config).await;

        let reply = transport.request("Debugger.pause", Value::Null);
        let _ = peer.recv_json().await;

        let err = reply.await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.bus().subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_reply_cancels() {
        let (transport, _peer) = connected_pair(TransportConfig::default()).await;

        let reply = transport.request("Debugger.pause", Value::Null);
        assert_eq!(transport.pending_count(), 1);
        drop(reply);

        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.bus().subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_max_pending_enforced() {
        let config = TransportConfig::new().with_max_pending(1);
        let (transport, _peer) = connected_pair(config).await;

        let _first = transport.request("A.one", Value::Null);
        let second = transport.request("A.two", Value::Null).await;
        assert!(matches!(second, Err(Error::TooManyPending { pending: 1, max: 1 })));
    }

    #[tokio::test]
    async fn test_peer_close_fails_pending_and_publishes() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        transport.bus().subscribe(TopicPattern::exact(SOCKET_CLOSE), move |_, payload| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(payload.clone());
            }
        });

        let reply = transport.request("Debugger.resume", Value::Null);
        let _ = peer.recv_json().await;
        peer.close().await;

        assert!(matches!(reply.await, Err(Error::ConnectionClosed)));
        let payload = rx.await.expect("Socket.close published");
        assert_eq!(payload["code"], 1000);
        assert_eq!(transport.state(), LinkState::Closed);
        assert!(matches!(
            transport.send("Debugger.pause", Value::Null),
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_peer_reset_publishes_error_then_close() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let recorded = Arc::new(Mutex::new(Vec::new()));
        {
            let recorded = Arc::clone(&recorded);
            transport.bus().subscribe(TopicPattern::domain("Socket"), move |topic, payload| {
                recorded.lock().push((topic.to_string(), payload.clone()));
            });
        }

        let reply = transport.request("Debugger.resume", Value::Null);
        let _ = peer.recv_json().await;
        peer.abort();

        assert!(matches!(reply.await, Err(Error::ConnectionClosed)));

        let recorded = recorded.lock().clone();
        let topics: Vec<&str> = recorded.iter().map(|(topic, _)| topic.as_str()).collect();
        assert_eq!(topics, [SOCKET_ERROR, SOCKET_CLOSE]);
        assert!(recorded[0].1["message"].as_str().is_some_and(|m| !m.is_empty()));
        assert_eq!(recorded[1].1, json!({}));
        assert_eq!(transport.state(), LinkState::Closed);
    }

    #[tokio::test]
    async fn test_close_keeps_pending_when_configured() {
        let config = TransportConfig::new()
            .with_fail_pending_on_close(false)
            .with_command_timeout(Some(Duration::from_millis(100)));
        let (transport, mut peer) = connected_pair(config).await;

        let reply = transport.request("Debugger.resume", Value::Null);
        let _ = peer.recv_json().await;
        peer.close().await;

        // Only the timeout completes the caller.
        assert!(reply.await.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_local_close() {
        let (transport, _peer) = connected_pair(TransportConfig::default()).await;
        transport.close().await;

        assert_eq!(transport.state(), LinkState::Closed);
        assert!(!transport.is_connected());

        // Closing twice is harmless.
        transport.close().await;
    }

    #[tokio::test]
    async fn test_reconnect_after_close() {
        let (transport, _peer) = connected_pair(TransportConfig::default()).await;
        transport.close().await;

        let peer = MockPeer::bind().await;
        let url = peer.url();
        let (connected, _socket) = tokio::join!(transport.connect(&url), peer.accept());
        connected.expect("reconnect");

        let id = transport.send("Runtime.enable", Value::Null).expect("send");
        assert!(id.as_u64() >= 1);
    }
}

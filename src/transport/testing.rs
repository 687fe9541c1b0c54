//! In-process WebSocket peer for transport tests.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use super::{Transport, TransportConfig};

// ============================================================================
// Constants
// ============================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// MockPeer
// ============================================================================

/// Listening side of a test connection.
pub(crate) struct MockPeer {
    listener: TcpListener,
    url: String,
}

impl MockPeer {
    pub(crate) async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        Self {
            listener,
            url: format!("ws://127.0.0.1:{port}/session"),
        }
    }

    pub(crate) fn url(&self) -> String {
        self.url.clone()
    }

    pub(crate) async fn accept(self) -> PeerSocket {
        let (stream, _) = self.listener.accept().await.expect("accept");
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade");

        PeerSocket { ws, url: self.url }
    }
}

// ============================================================================
// PeerSocket
// ============================================================================

/// Accepted peer end of a test connection.
pub(crate) struct PeerSocket {
    ws: WebSocketStream<TcpStream>,
    url: String,
}

impl PeerSocket {
    pub(crate) fn url(&self) -> String {
        self.url.clone()
    }

    /// Reads the next text frame as JSON.
    pub(crate) async fn recv_json(&mut self) -> Value {
        loop {
            let message = timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("frame within timeout")
                .expect("stream open")
                .expect("valid frame");

            if let Message::Text(text) = message {
                return serde_json::from_str(&text).expect("JSON frame");
            }
        }
    }

    pub(crate) async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    pub(crate) async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("send");
    }

    /// Sends a normal close frame and drains until the socket ends.
    pub(crate) async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        };
        let _ = self.ws.close(Some(frame)).await;
        while let Ok(Some(Ok(_))) = timeout(RECV_TIMEOUT, self.ws.next()).await {}
    }

    /// Drops the TCP stream without a closing handshake.
    pub(crate) fn abort(self) {
        drop(self.ws);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns a transport connected to a fresh peer.
pub(crate) async fn connected_pair(config: TransportConfig) -> (Transport, PeerSocket) {
    let transport = Transport::new(config);
    let peer = MockPeer::bind().await;
    let url = peer.url();

    let (connected, socket) = tokio::join!(transport.connect(&url), peer.accept());
    connected.expect("connect");

    (transport, socket)
}

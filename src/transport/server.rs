//! Reverse-connect listener.
//!
//! Some peers dial out instead of listening. [`PendingServer`] binds a
//! local port, hands its URL to whoever launches the peer, then attaches
//! the first incoming WebSocket to a [`Transport`].
//!
//! # Connection Flow
//!
//! 1. Bind to `localhost:0` (random port)
//! 2. Pass [`PendingServer::ws_url`] to the peer
//! 3. Peer connects; the socket is upgraded and attached
//! 4. Peer emits its handshake event; `wait_ready` returns

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

use super::Transport;
use super::config::millis;

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket listener that is bound but not yet connected.
///
/// # Example
///
/// ```no_run
/// use std::net::{IpAddr, Ipv4Addr};
/// use devtools_mux::{Transport, TransportConfig};
/// use devtools_mux::transport::PendingServer;
///
/// # async fn example() -> devtools_mux::Result<()> {
/// let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// println!("point the peer at {}", server.ws_url());
///
/// let transport = Transport::new(TransportConfig::default());
/// server.accept(&transport).await?;
/// transport.wait_ready().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PendingServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl PendingServer {
    /// Binds to `ip:port`. Port 0 lets the OS pick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let addr = listener.local_addr()?;

        debug!(%addr, "WebSocket listener bound");

        Ok(Self { listener, addr })
    }

    /// Returns the bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the URL the peer should dial: `ws://{addr}`.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Waits for one peer, upgrades it and attaches it to `transport`.
    ///
    /// Uses the transport's connect timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if no peer connects in time
    /// - [`Error::WebSocket`] if the WebSocket upgrade fails
    /// - [`Error::AlreadyConnected`] if `transport` already has a socket
    pub async fn accept(self, transport: &Transport) -> Result<()> {
        if transport.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let limit = transport.config().connect_timeout;
        let (stream, peer) = timeout(limit, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(millis(limit)))??;

        debug!(%peer, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream).await?;

        transport.connect_stream(ws_stream, &format!("ws://{peer}"))
    }
}

// ============================================================================
// Tests
// ============================================================================

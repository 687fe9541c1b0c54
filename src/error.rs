//! Error types for the protocol multiplexer.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_mux::{Controllers, Result};
//!
//! async fn example(controllers: &Controllers) -> Result<()> {
//!     controllers.debugger().enable().await?;
//!     controllers.debugger().pause().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidPattern`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::NotConnected`], [`Error::AlreadyConnected`] |
//! | Protocol | [`Error::Protocol`], [`Error::TooManyPending`] |
//! | Command | [`Error::CommandFailed`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a transport address or option is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Topic pattern failed to compile.
    #[error("Invalid topic pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The pattern source text.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Timed out waiting for the connection or the handshake event.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed while a command was outstanding.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The transport has no live socket.
    #[error("Transport is not connected")]
    NotConnected,

    /// The transport already owns a live socket.
    #[error("Transport is already connected")]
    AlreadyConnected,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Too many commands awaiting replies.
    #[error("Too many pending commands: {pending}/{max}")]
    TooManyPending {
        /// Commands currently outstanding.
        pending: usize,
        /// Configured ceiling.
        max: usize,
    },

    // ========================================================================
    // Command Errors
    // ========================================================================
    /// The peer answered a command with an `error` object.
    #[error("{method} failed ({code}): {message}")]
    CommandFailed {
        /// Method that was sent, e.g. `Debugger.pause`.
        method: String,
        /// Peer error code.
        code: i64,
        /// Peer error message.
        message: String,
        /// Optional extra data the peer attached.
        data: Option<Value>,
    },

    /// No reply arrived within the command timeout.
    #[error("Command {command_id} ({method}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The command that timed out.
        command_id: CommandId,
        /// Method that was sent.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket handshake or upgrade error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[inline]
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a command failure from a peer error reply.
    #[inline]
    pub fn command_failed(
        method: impl Into<String>,
        code: i64,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self::CommandFailed {
            method: method.into(),
            code,
            message: message.into(),
            data,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(command_id: CommandId, method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            command_id,
            method: method.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the peer rejected the command.
    #[inline]
    #[must_use]
    pub fn is_command_error(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }

    /// Returns the peer error code for a rejected command.
    #[inline]
    #[must_use]
    pub fn command_code(&self) -> Option<i64> {
        match self {
            Self::CommandFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection_timeout(250);
        assert_eq!(err.to_string(), "Connection timeout after 250ms");
    }

    #[test]
    fn test_command_failed_display() {
        let err = Error::command_failed("Debugger.pause", -1, "boom", None);
        assert_eq!(err.to_string(), "Debugger.pause failed (-1): boom");
        assert!(err.is_command_error());
        assert_eq!(err.command_code(), Some(-1));
    }

    #[test]
    fn test_is_timeout() {
        let id = CommandId::new(3).expect("non-zero");
        assert!(Error::request_timeout(id, "Runtime.evaluate", 10).is_timeout());
        assert!(Error::connection_timeout(5000).is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(!Error::config("bad").is_connection_error());
        assert!(!Error::AlreadyConnected.is_connection_error());
    }

    #[test]
    fn test_invalid_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = Error::invalid_pattern("(", source);
        assert!(err.to_string().starts_with("Invalid topic pattern `(`"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_websocket_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }
}

//! Transport configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use devtools_mux::TransportConfig;
//!
//! let config = TransportConfig::new()
//!     .with_command_timeout(Some(Duration::from_secs(5)))
//!     .with_handshake_event("Inspector.ready")
//!     .with_max_pending(32);
//!
//! assert_eq!(config.max_pending, 32);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default time a command may wait for its reply.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for the peer's readiness event.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default ceiling on outstanding commands.
pub const DEFAULT_MAX_PENDING: usize = 100;

/// Event the peer emits once it accepts domain commands.
pub const DEFAULT_HANDSHAKE_EVENT: &str = "Proxy.ready";

// ============================================================================
// TransportConfig
// ============================================================================

/// Tunables for one [`Transport`](super::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Reply deadline per command; `None` waits forever.
    pub command_timeout: Option<Duration>,

    /// Deadline for the WebSocket opening handshake.
    pub connect_timeout: Duration,

    /// Deadline used by `wait_ready`.
    pub ready_timeout: Duration,

    /// Event method that marks the channel usable.
    pub handshake_event: String,

    /// Maximum commands awaiting replies at once.
    pub max_pending: usize,

    /// Reject outstanding commands when the socket goes away.
    pub fail_pending_on_close: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            handshake_event: DEFAULT_HANDSHAKE_EVENT.to_string(),
            max_pending: DEFAULT_MAX_PENDING,
            fail_pending_on_close: true,
        }
    }

    /// Sets the per-command reply deadline.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the WebSocket handshake deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the readiness deadline.
    #[inline]
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Sets the readiness event method.
    #[inline]
    #[must_use]
    pub fn with_handshake_event(mut self, method: impl Into<String>) -> Self {
        self.handshake_event = method.into();
        self
    }

    /// Sets the outstanding command ceiling.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = max;
        self
    }

    /// Chooses whether outstanding commands fail when the socket closes.
    ///
    /// With `false`, awaiting callers only complete through their timeout.
    #[inline]
    #[must_use]
    pub fn with_fail_pending_on_close(mut self, fail: bool) -> Self {
        self.fail_pending_on_close = fail;
        self
    }
}

/// Whole milliseconds in `limit`, saturating at `u64::MAX`.
pub(crate) fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::from_micros(999)), 0);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.command_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.ready_timeout.as_secs(), 30);
        assert_eq!(config.handshake_event, "Proxy.ready");
        assert_eq!(config.max_pending, 100);
        assert!(config.fail_pending_on_close);
    }

    #[test]
    fn test_builder_chain() {
        let config = TransportConfig::new()
            .with_command_timeout(None)
            .with_connect_timeout(Duration::from_secs(2))
            .with_ready_timeout(Duration::from_millis(500))
            .with_handshake_event("Target.ready")
            .with_max_pending(4)
            .with_fail_pending_on_close(false);

        assert_eq!(config.command_timeout, None);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.ready_timeout, Duration::from_millis(500));
        assert_eq!(config.handshake_event, "Target.ready");
        assert_eq!(config.max_pending, 4);
        assert!(!config.fail_pending_on_close);
    }
}

//! Futures for outstanding commands.
//!
//! A command moves through `Sent → AwaitingReply → Resolved | Rejected`.
//! The frame is already on its way when a [`PendingReply`] is handed out;
//! awaiting only waits for the correlated reply. Dropping the future
//! unsubscribes its reply handler, which silences the caller without
//! stopping the peer from answering.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{Instant, Sleep, sleep_until};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::config::millis;
use super::connection::TransportInner;

// ============================================================================
// PendingReply
// ============================================================================

/// Result of one command, resolved by exactly one reply.
///
/// Resolves with the reply's `result` (or `null`), or rejects with
/// [`Error::CommandFailed`], [`Error::RequestTimeout`] or
/// [`Error::ConnectionClosed`].
#[must_use = "dropping a PendingReply discards the command's result"]
pub struct PendingReply {
    state: State,
}

enum State {
    /// Waiting on the reply channel.
    Waiting(Waiting),
    /// Failed before the frame was sent.
    Failed(Option<Error>),
    /// Already yielded its output.
    Done,
}

struct Waiting {
    id: CommandId,
    method: String,
    rx: oneshot::Receiver<Result<Value>>,
    timeout: Option<(Duration, Instant)>,
    sleep: Option<Pin<Box<Sleep>>>,
    transport: Weak<TransportInner>,
}

impl PendingReply {
    pub(crate) fn waiting(
        id: CommandId,
        method: String,
        rx: oneshot::Receiver<Result<Value>>,
        timeout: Option<Duration>,
        transport: Weak<TransportInner>,
    ) -> Self {
        Self {
            state: State::Waiting(Waiting {
                id,
                method,
                rx,
                timeout: timeout.map(|limit| (limit, Instant::now() + limit)),
                sleep: None,
                transport,
            }),
        }
    }

    /// A reply that rejects immediately, for commands that never left.
    pub fn failed(error: Error) -> Self {
        Self {
            state: State::Failed(Some(error)),
        }
    }

    /// Returns the command id, if the command was sent.
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        match &self.state {
            State::Waiting(waiting) => Some(waiting.id),
            State::Failed(_) | State::Done => None,
        }
    }

    /// Deserializes the result into `T` once it arrives.
    pub fn decode<T: DeserializeOwned>(self) -> TypedReply<T> {
        TypedReply {
            reply: self,
            _marker: PhantomData,
        }
    }
}

impl Future for PendingReply {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let output = match &mut self.state {
            State::Done => return Poll::Ready(Err(Error::protocol("reply already taken"))),
            State::Failed(error) => Err(error.take().unwrap_or(Error::ConnectionClosed)),
            State::Waiting(waiting) => match waiting.poll_reply(cx) {
                Poll::Ready(output) => output,
                Poll::Pending => return Poll::Pending,
            },
        };

        self.state = State::Done;
        Poll::Ready(output)
    }
}

impl Waiting {
    fn poll_reply(&mut self, cx: &mut Context<'_>) -> Poll<Result<Value>> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => return Poll::Ready(result),
            Poll::Ready(Err(_)) => return Poll::Ready(Err(Error::ConnectionClosed)),
            Poll::Pending => {}
        }

        let Some((limit, deadline)) = self.timeout else {
            return Poll::Pending;
        };

        let sleep = self
            .sleep
            .get_or_insert_with(|| Box::pin(sleep_until(deadline)));

        if sleep.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }

        debug!(id = %self.id, method = %self.method, "Command timed out");
        self.forget();
        Poll::Ready(Err(Error::request_timeout(
            self.id,
            self.method.as_str(),
            millis(limit),
        )))
    }

    /// Drops the pending entry and its reply subscription.
    fn forget(&self) {
        if let Some(transport) = self.transport.upgrade() {
            transport.forget(self.id);
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if let State::Waiting(waiting) = &self.state {
            waiting.forget();
        }
    }
}

// ============================================================================
// TypedReply
// ============================================================================

/// A [`PendingReply`] whose result is deserialized into `T`.
#[must_use = "dropping a TypedReply discards the command's result"]
pub struct TypedReply<T> {
    reply: PendingReply,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedReply<T> {
    /// Returns the command id, if the command was sent.
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        self.reply.id()
    }
}

impl<T: DeserializeOwned> Future for TypedReply<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.reply).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(serde_json::from_value(value).map_err(Error::from)),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Console domain.

use std::ops::Deref;

use serde_json::json;

use crate::transport::{PendingReply, Transport};

use super::DomainController;

/// Facade for the `Console` domain.
///
/// Messages arrive as `messageAdded` events; see [`DomainController::events`].
#[derive(Debug, Clone)]
pub struct Console {
    controller: DomainController,
}

impl Console {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "Console";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Enables message events; buffered messages are replayed.
    pub fn enable(&self) -> PendingReply {
        self.call("enable", json!({}))
    }

    /// Disables message events.
    pub fn disable(&self) -> PendingReply {
        self.call("disable", json!({}))
    }

    /// Clears buffered messages.
    pub fn clear_messages(&self) -> PendingReply {
        self.call("clearMessages", json!({}))
    }
}

impl Deref for Console {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

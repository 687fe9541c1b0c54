//! Profiler domain: CPU sampling.

use std::ops::Deref;

use serde_json::json;

use crate::transport::{PendingReply, Transport};

use super::DomainController;

/// Facade for the `Profiler` domain.
#[derive(Debug, Clone)]
pub struct Profiler {
    controller: DomainController,
}

impl Profiler {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "Profiler";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Enables the profiler.
    pub fn enable(&self) -> PendingReply {
        self.call("enable", json!({}))
    }

    /// Disables the profiler.
    pub fn disable(&self) -> PendingReply {
        self.call("disable", json!({}))
    }

    /// Starts sampling.
    pub fn start(&self) -> PendingReply {
        self.call("start", json!({}))
    }

    /// Stops sampling. The reply's `profile` field holds the raw profile.
    pub fn stop(&self) -> PendingReply {
        self.call("stop", json!({}))
    }

    /// Sets the sampling interval in microseconds. Call before `start`.
    pub fn set_sampling_interval(&self, interval_us: u32) -> PendingReply {
        self.call("setSamplingInterval", json!({ "interval": interval_us }))
    }
}

impl Deref for Profiler {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

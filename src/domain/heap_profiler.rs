//! HeapProfiler domain: snapshots and allocation tracking.

use std::ops::Deref;

use serde_json::json;

use crate::transport::{PendingReply, Transport};

use super::DomainController;

/// Facade for the `HeapProfiler` domain.
///
/// Snapshot data streams back as `addHeapSnapshotChunk` events while
/// `take_heap_snapshot` is outstanding.
#[derive(Debug, Clone)]
pub struct HeapProfiler {
    controller: DomainController,
}

impl HeapProfiler {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "HeapProfiler";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Enables the heap profiler.
    pub fn enable(&self) -> PendingReply {
        self.call("enable", json!({}))
    }

    /// Disables the heap profiler.
    pub fn disable(&self) -> PendingReply {
        self.call("disable", json!({}))
    }

    /// Takes a heap snapshot.
    pub fn take_heap_snapshot(&self, report_progress: bool) -> PendingReply {
        self.call("takeHeapSnapshot", json!({ "reportProgress": report_progress }))
    }

    /// Forces a garbage collection.
    pub fn collect_garbage(&self) -> PendingReply {
        self.call("collectGarbage", json!({}))
    }

    /// Starts tracking heap object allocation.
    pub fn start_tracking_heap_objects(&self, track_allocations: bool) -> PendingReply {
        self.call(
            "startTrackingHeapObjects",
            json!({ "trackAllocations": track_allocations }),
        )
    }

    /// Stops tracking; a final snapshot is streamed if requested.
    pub fn stop_tracking_heap_objects(&self, report_progress: bool) -> PendingReply {
        self.call(
            "stopTrackingHeapObjects",
            json!({ "reportProgress": report_progress }),
        )
    }
}

impl Deref for HeapProfiler {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

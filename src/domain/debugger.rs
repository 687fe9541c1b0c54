//! Debugger domain: execution control and breakpoints.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Deref;

use serde_json::{Map, Value, json};

use crate::transport::{PendingReply, Transport, TypedReply};

use super::DomainController;
use super::types::{BreakpointSet, EvaluateResult, PauseOnExceptions, ScriptSource};

// ============================================================================
// Debugger
// ============================================================================

/// Facade for the `Debugger` domain.
///
/// Derefs to [`DomainController`] for `on`, `off` and raw `call`.
///
/// # Example
///
/// ```no_run
/// use devtools_mux::domain::Debugger;
/// # async fn example(debugger: Debugger) -> devtools_mux::Result<()> {
/// debugger.on("paused", |params| println!("paused: {}", params["reason"]));
/// debugger.enable().await?;
///
/// let bp = debugger.set_breakpoint_by_url(12, "app.js", None, None).await?;
/// println!("breakpoint {}", bp.breakpoint_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Debugger {
    controller: DomainController,
}

impl Debugger {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "Debugger";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Enables debugging events.
    pub fn enable(&self) -> PendingReply {
        self.call("enable", json!({}))
    }

    /// Disables debugging events.
    pub fn disable(&self) -> PendingReply {
        self.call("disable", json!({}))
    }

    /// Pauses on the next statement.
    pub fn pause(&self) -> PendingReply {
        self.call("pause", json!({}))
    }

    /// Resumes execution.
    pub fn resume(&self) -> PendingReply {
        self.call("resume", json!({}))
    }

    /// Steps over the current statement.
    pub fn step_over(&self) -> PendingReply {
        self.call("stepOver", json!({}))
    }

    /// Steps into the current call.
    pub fn step_into(&self) -> PendingReply {
        self.call("stepInto", json!({}))
    }

    /// Steps out of the current function.
    pub fn step_out(&self) -> PendingReply {
        self.call("stepOut", json!({}))
    }

    /// Sets a breakpoint by script URL.
    ///
    /// `column_number` and `condition` are omitted from the frame when `None`.
    pub fn set_breakpoint_by_url(
        &self,
        line_number: u32,
        url: &str,
        column_number: Option<u32>,
        condition: Option<&str>,
    ) -> TypedReply<BreakpointSet> {
        let mut params = Map::new();
        params.insert("lineNumber".into(), json!(line_number));
        params.insert("url".into(), json!(url));
        if let Some(column) = column_number {
            params.insert("columnNumber".into(), json!(column));
        }
        if let Some(condition) = condition {
            params.insert("condition".into(), json!(condition));
        }

        self.call("setBreakpointByUrl", Value::Object(params)).decode()
    }

    /// Removes a breakpoint.
    pub fn remove_breakpoint(&self, breakpoint_id: &str) -> PendingReply {
        self.call("removeBreakpoint", json!({ "breakpointId": breakpoint_id }))
    }

    /// Activates or deactivates all breakpoints.
    pub fn set_breakpoints_active(&self, active: bool) -> PendingReply {
        self.call("setBreakpointsActive", json!({ "active": active }))
    }

    /// Chooses when thrown exceptions pause execution.
    pub fn set_pause_on_exceptions(&self, state: PauseOnExceptions) -> PendingReply {
        self.call("setPauseOnExceptions", json!({ "state": state }))
    }

    /// Fetches a script's source text.
    pub fn get_script_source(&self, script_id: &str) -> TypedReply<ScriptSource> {
        self.call("getScriptSource", json!({ "scriptId": script_id }))
            .decode()
    }

    /// Evaluates `expression` in a paused call frame.
    pub fn evaluate_on_call_frame(
        &self,
        call_frame_id: &str,
        expression: &str,
    ) -> TypedReply<EvaluateResult> {
        self.call(
            "evaluateOnCallFrame",
            json!({ "callFrameId": call_frame_id, "expression": expression }),
        )
        .decode()
    }
}

impl Deref for Debugger {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

// ============================================================================
// Tests
// ============================================================================

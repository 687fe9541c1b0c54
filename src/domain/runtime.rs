//! Runtime domain: evaluation and remote objects.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Deref;

use serde::Serialize;
use serde_json::{Value, json};

use crate::transport::{PendingReply, Transport, TypedReply};

use super::DomainController;
use super::types::{EvaluateOptions, EvaluateResult, PropertiesResult};

// ============================================================================
// Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateParams<'a> {
    expression: &'a str,
    #[serde(flatten)]
    options: &'a EvaluateOptions,
}

// ============================================================================
// Runtime
// ============================================================================

/// Facade for the `Runtime` domain.
#[derive(Debug, Clone)]
pub struct Runtime {
    controller: DomainController,
}

impl Runtime {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "Runtime";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Enables execution context events.
    pub fn enable(&self) -> PendingReply {
        self.call("enable", json!({}))
    }

    /// Disables execution context events.
    pub fn disable(&self) -> PendingReply {
        self.call("disable", json!({}))
    }

    /// Evaluates an expression in the global context.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use devtools_mux::domain::{EvaluateOptions, Runtime};
    /// # async fn example(runtime: Runtime) -> devtools_mux::Result<()> {
    /// let options = EvaluateOptions::new().return_by_value(true);
    /// let result = runtime.evaluate("1 + 1", &options).await?;
    /// assert_eq!(result.result.value, Some(serde_json::json!(2)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn evaluate(&self, expression: &str, options: &EvaluateOptions) -> TypedReply<EvaluateResult> {
        self.call_with("evaluate", &EvaluateParams { expression, options })
            .decode()
    }

    /// Lists the properties of a remote object.
    pub fn get_properties(
        &self,
        object_id: &str,
        own_properties: bool,
    ) -> TypedReply<PropertiesResult> {
        self.call(
            "getProperties",
            json!({ "objectId": object_id, "ownProperties": own_properties }),
        )
        .decode()
    }

    /// Calls a function with `object_id` as `this`.
    ///
    /// `arguments` are passed as call arguments in the protocol's
    /// `{"value": ...}` / `{"objectId": ...}` form.
    pub fn call_function_on(
        &self,
        function_declaration: &str,
        object_id: &str,
        arguments: Vec<Value>,
    ) -> TypedReply<EvaluateResult> {
        self.call(
            "callFunctionOn",
            json!({
                "functionDeclaration": function_declaration,
                "objectId": object_id,
                "arguments": arguments,
            }),
        )
        .decode()
    }

    /// Releases one remote object.
    pub fn release_object(&self, object_id: &str) -> PendingReply {
        self.call("releaseObject", json!({ "objectId": object_id }))
    }

    /// Releases every object in a group.
    pub fn release_object_group(&self, object_group: &str) -> PendingReply {
        self.call("releaseObjectGroup", json!({ "objectGroup": object_group }))
    }

    /// Lets a debuggee started with wait-for-debugger run.
    pub fn run_if_waiting_for_debugger(&self) -> PendingReply {
        self.call("runIfWaitingForDebugger", json!({}))
    }
}

impl Deref for Runtime {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Typed command parameters and results.
//!
//! Only the fields the facades rely on are modelled; everything else is
//! kept in raw form so unknown peers still decode.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Runtime
// ============================================================================

/// Mirror of a value living in the debuggee.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type (`object`, `number`, `string`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Subtype hint (`array`, `null`, `error`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Class name for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Primitive value, or the JSON form when returned by value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// String representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Handle for non-primitive values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// Details of an exception raised during evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception id.
    #[serde(default)]
    pub exception_id: i64,

    /// Short description.
    #[serde(default)]
    pub text: String,

    /// Zero-based line.
    #[serde(default)]
    pub line_number: i64,

    /// Zero-based column.
    #[serde(default)]
    pub column_number: i64,

    /// Script URL, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The thrown value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<RemoteObject>,
}

/// Options for `Runtime.evaluate`.
///
/// Unset fields are omitted from the frame so the peer applies its own
/// defaults.
///
/// # Example
///
/// ```
/// use devtools_mux::domain::EvaluateOptions;
///
/// let options = EvaluateOptions::new()
///     .return_by_value(true)
///     .object_group("console");
///
/// assert_eq!(options.return_by_value, Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOptions {
    /// Group for later bulk release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_group: Option<String>,

    /// Treat the expression as if typed in a console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_command_line_api: Option<bool>,

    /// Suppress pause-on-exception during evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,

    /// Target execution context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<i64>,

    /// Return the JSON value instead of a handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,

    /// Await a returned promise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
}

impl EvaluateOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the object group.
    #[must_use]
    pub fn object_group(mut self, group: impl Into<String>) -> Self {
        self.object_group = Some(group.into());
        self
    }

    /// Enables console command line helpers.
    #[must_use]
    pub fn include_command_line_api(mut self, include: bool) -> Self {
        self.include_command_line_api = Some(include);
        self
    }

    /// Suppresses exception pauses.
    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    /// Targets an execution context.
    #[must_use]
    pub fn context_id(mut self, id: i64) -> Self {
        self.context_id = Some(id);
        self
    }

    /// Requests the result by value.
    #[must_use]
    pub fn return_by_value(mut self, by_value: bool) -> Self {
        self.return_by_value = Some(by_value);
        self
    }

    /// Awaits promise results.
    #[must_use]
    pub fn await_promise(mut self, await_promise: bool) -> Self {
        self.await_promise = Some(await_promise);
        self
    }
}

/// Result of `Runtime.evaluate`, `Runtime.callFunctionOn` and
/// `Debugger.evaluateOnCallFrame`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// Evaluation result.
    #[serde(default)]
    pub result: RemoteObject,

    /// Present when the evaluation threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl EvaluateResult {
    /// Returns `true` if the evaluation threw.
    #[inline]
    #[must_use]
    pub fn threw(&self) -> bool {
        self.exception_details.is_some()
    }
}

/// One property of a remote object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,

    /// Property value, absent for accessors.
    #[serde(default)]
    pub value: Option<RemoteObject>,

    /// Writable flag.
    #[serde(default)]
    pub writable: bool,

    /// Enumerable flag.
    #[serde(default)]
    pub enumerable: bool,

    /// Own property rather than inherited.
    #[serde(default)]
    pub is_own: bool,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesResult {
    /// Properties of the object.
    #[serde(default)]
    pub result: Vec<PropertyDescriptor>,

    /// Present when reading properties threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

// ============================================================================
// Debugger
// ============================================================================

/// Script position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Script id.
    pub script_id: String,

    /// Zero-based line.
    pub line_number: u32,

    /// Zero-based column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

/// Result of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointSet {
    /// Id for `Debugger.removeBreakpoint`.
    pub breakpoint_id: String,

    /// Locations the breakpoint resolved to so far.
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Result of `Debugger.getScriptSource`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSource {
    /// Script text.
    pub script_source: String,
}

/// Exception pause mode for `Debugger.setPauseOnExceptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseOnExceptions {
    /// Never pause.
    None,
    /// Pause on uncaught exceptions.
    Uncaught,
    /// Pause on every exception.
    All,
}

// ============================================================================
// Schema
// ============================================================================

/// One domain advertised by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaDomain {
    /// Domain name.
    pub name: String,

    /// Domain version.
    #[serde(default)]
    pub version: String,
}

/// Result of `Schema.getDomains`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DomainsResult {
    /// Advertised domains.
    #[serde(default)]
    pub domains: Vec<SchemaDomain>,
}

// ============================================================================
// Tests
// ============================================================================

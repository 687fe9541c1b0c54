//! Typed view of common events.
//!
//! Controllers hand raw params to handlers; [`ParsedEvent::parse`] is a
//! convenience for consumers that prefer matching on variants.
//!
//! # Parsed Events
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Debugger` | `paused`, `resumed`, `scriptParsed`, `breakpointResolved` |
//! | `Runtime` | `consoleAPICalled`, `exceptionThrown`, `executionContextCreated` |
//! | `Console` | `messageAdded` |
//! | `Proxy` | `ready` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use super::EventFrame;

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Execution paused.
    DebuggerPaused {
        /// Pause reason (`breakpoint`, `exception`, `other`, ...).
        reason: String,
        /// Breakpoint ids that were hit.
        hit_breakpoints: Vec<String>,
        /// Raw call frames.
        call_frames: Vec<Value>,
    },

    /// Execution resumed.
    DebuggerResumed,

    /// A script was parsed.
    DebuggerScriptParsed {
        /// Script id.
        script_id: String,
        /// Script URL (may be empty).
        url: String,
    },

    /// A breakpoint was bound to a location.
    DebuggerBreakpointResolved {
        /// Breakpoint id.
        breakpoint_id: String,
        /// Resolved location.
        location: Value,
    },

    /// `console.*` was called in the debuggee.
    RuntimeConsoleApiCalled {
        /// Call type (`log`, `warn`, ...).
        kind: String,
        /// Raw call arguments.
        args: Vec<Value>,
    },

    /// An exception was thrown and not caught.
    RuntimeExceptionThrown {
        /// Exception text.
        text: String,
        /// Raw exception details.
        details: Value,
    },

    /// An execution context was created.
    RuntimeExecutionContextCreated {
        /// Raw context description.
        context: Value,
    },

    /// A console message was added.
    ConsoleMessageAdded {
        /// Message level.
        level: String,
        /// Message text.
        text: String,
    },

    /// The peer is ready to accept domain commands.
    ProxyReady,

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

impl ParsedEvent {
    /// Parses an event by method name and params.
    #[must_use]
    pub fn parse(method: &str, params: &Value) -> Self {
        let get = Params(params);

        match method {
            "Debugger.paused" => Self::DebuggerPaused {
                reason: get.string("reason"),
                hit_breakpoints: get
                    .array("hitBreakpoints")
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                call_frames: get.array("callFrames"),
            },

            "Debugger.resumed" => Self::DebuggerResumed,

            "Debugger.scriptParsed" => Self::DebuggerScriptParsed {
                script_id: get.string("scriptId"),
                url: get.string("url"),
            },

            "Debugger.breakpointResolved" => Self::DebuggerBreakpointResolved {
                breakpoint_id: get.string("breakpointId"),
                location: get.value("location"),
            },

            "Runtime.consoleAPICalled" => Self::RuntimeConsoleApiCalled {
                kind: get.string("type"),
                args: get.array("args"),
            },

            "Runtime.exceptionThrown" => {
                let details = get.value("exceptionDetails");
                let text = details
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Self::RuntimeExceptionThrown { text, details }
            }

            "Runtime.executionContextCreated" => Self::RuntimeExecutionContextCreated {
                context: get.value("context"),
            },

            "Console.messageAdded" => {
                let message = Params(params.get("message").unwrap_or(&Value::Null));
                Self::ConsoleMessageAdded {
                    level: message.string("level"),
                    text: message.string("text"),
                }
            }

            "Proxy.ready" => Self::ProxyReady,

            _ => Self::Unknown {
                method: method.to_string(),
                params: params.clone(),
            },
        }
    }
}

impl From<&EventFrame> for ParsedEvent {
    fn from(event: &EventFrame) -> Self {
        Self::parse(&event.method, &event.params)
    }
}

// ============================================================================
// Params
// ============================================================================

/// Lenient field access; missing or mistyped fields read as defaults.
struct Params<'a>(&'a Value);

impl Params<'_> {
    #[inline]
    fn string(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    #[inline]
    fn array(&self, key: &str) -> Vec<Value> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    #[inline]
    fn value(&self, key: &str) -> Value {
        self.0.get(key).cloned().unwrap_or(Value::Null)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Wire frames and inbound classification.
//!
//! Every socket message is one JSON object in one of three shapes:
//!
//! ```json
//! {"id": 1, "method": "Debugger.pause", "params": {}}        // command
//! {"id": 1, "result": {}}                                    // reply
//! {"id": 1, "error": {"code": -32000, "message": "..."}}     // reply
//! {"method": "Debugger.paused", "params": {"reason": "..."}} // event
//! ```
//!
//! Inbound frames carrying both `id` and `method`, or neither, are
//! rejected by [`Frame::parse`].

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

// ============================================================================
// CommandFrame
// ============================================================================

/// Outbound command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandFrame {
    /// Correlation id.
    pub id: CommandId,
    /// `<Domain>.<command>`.
    pub method: String,
    /// Always an object; `null` params are sent as `{}`.
    pub params: Value,
}

impl CommandFrame {
    /// Creates a command frame.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Reply
// ============================================================================

/// Error object carried by a failed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyError {
    /// Peer error code.
    pub code: i64,
    /// Peer error message.
    pub message: String,
    /// Optional extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Reply to a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error object (if failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl Reply {
    /// Decodes a reply from the frame published on `response:<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the frame is not reply-shaped.
    pub fn from_value(frame: &Value) -> Result<Self> {
        Ok(Self::deserialize(frame)?)
    }

    /// Returns `true` if the peer reported an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result, or the peer error as [`Error::CommandFailed`].
    ///
    /// A reply with neither field resolves to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] if the reply carried `error`.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            Some(err) => Err(Error::command_failed(method, err.code, err.message, err.data)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// EventFrame
// ============================================================================

/// Unsolicited event from the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    /// `<Domain>.<event>`.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl EventFrame {
    /// Returns the domain part of the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split_once('.').map_or(self.method.as_str(), |(d, _)| d)
    }

    /// Returns the event name part of the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split_once('.').map_or("", |(_, e)| e)
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Reply to a prior command; `frame` is the whole JSON object.
    Reply {
        /// Echoed command id.
        id: CommandId,
        /// The full frame, carrying `result` or `error`.
        frame: Value,
    },
    /// Unsolicited event.
    Event(EventFrame),
}

/// Reasons an inbound frame is dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Has both `id` and `method`.
    #[error("ambiguous frame: has both id and method")]
    Ambiguous,

    /// Has neither `id` nor `method`.
    #[error("unknown frame: has neither id nor method")]
    Unknown,

    /// `id` is not a positive integer.
    #[error("invalid reply id: {0}")]
    InvalidId(Value),

    /// `method` is not a string.
    #[error("invalid event method: {0}")]
    InvalidMethod(Value),
}

impl Frame {
    /// Parses and classifies one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing why the frame must be dropped.
    pub fn parse(text: &str) -> std::result::Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        Self::classify(value)
    }

    /// Classifies an already decoded frame.
    ///
    /// A key holding `null` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing why the frame must be dropped.
    pub fn classify(value: Value) -> std::result::Result<Self, FrameError> {
        let Value::Object(mut object) = value else {
            return Err(FrameError::NotAnObject);
        };

        let id = object.get("id").filter(|v| !v.is_null()).cloned();
        let method = object.remove("method").filter(|v| !v.is_null());

        match (id, method) {
            (Some(_), Some(_)) => Err(FrameError::Ambiguous),
            (None, None) => Err(FrameError::Unknown),
            (Some(id), None) => {
                let id = id
                    .as_u64()
                    .and_then(CommandId::new)
                    .ok_or(FrameError::InvalidId(id))?;
                Ok(Self::Reply {
                    id,
                    frame: Value::Object(object),
                })
            }
            (None, Some(method)) => {
                let Value::String(method) = method else {
                    return Err(FrameError::InvalidMethod(method));
                };
                let params = object.remove("params").unwrap_or(Value::Null);
                Ok(Self::Event(EventFrame { method, params }))
            }
        }
    }

    /// Returns the bus topic this frame is published under.
    #[must_use]
    pub fn topic(&self) -> String {
        match self {
            Self::Reply { id, .. } => id.reply_topic(),
            Self::Event(event) => event.method.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn id(raw: u64) -> CommandId {
        CommandId::new(raw).expect("non-zero")
    }

    #[test]
    fn test_command_serialization() {
        let frame = CommandFrame::new(id(1), "Debugger.pause", Value::Null);
        let json = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(json, json!({"id": 1, "method": "Debugger.pause", "params": {}}));
    }

    #[test]
    fn test_command_keeps_params() {
        let frame = CommandFrame::new(id(2), "Runtime.evaluate", json!({"expression": "1+1"}));
        let json = serde_json::to_string(&frame).expect("serialize");
        assert!(json.contains(r#""expression":"1+1""#));
    }

    #[test]
    fn test_reply_classified() {
        let frame = Frame::parse(r#"{"id":7,"result":{"x":1}}"#).expect("classify");
        match frame {
            Frame::Reply { id: reply_id, ref frame } => {
                assert_eq!(reply_id, id(7));
                assert_eq!(frame["result"]["x"], 1);
            }
            Frame::Event(_) => panic!("expected reply"),
        }
        assert_eq!(
            Frame::parse(r#"{"id":7,"result":{}}"#).expect("classify").topic(),
            "response:7"
        );
    }

    #[test]
    fn test_event_classified() {
        let frame =
            Frame::parse(r#"{"method":"Debugger.paused","params":{"reason":"breakpoint"}}"#)
                .expect("classify");
        assert_eq!(frame.topic(), "Debugger.paused");
        match frame {
            Frame::Event(event) => {
                assert_eq!(event.domain(), "Debugger");
                assert_eq!(event.event_name(), "paused");
                assert_eq!(event.params["reason"], "breakpoint");
            }
            Frame::Reply { .. } => panic!("expected event"),
        }
    }

    #[test]
    fn test_event_without_params() {
        let frame = Frame::parse(r#"{"method":"Proxy.ready"}"#).expect("classify");
        match frame {
            Frame::Event(event) => assert!(event.params.is_null()),
            Frame::Reply { .. } => panic!("expected event"),
        }
    }

    #[test]
    fn test_ambiguous_frame_rejected() {
        let err = Frame::parse(r#"{"id":1,"method":"Debugger.pause"}"#).unwrap_err();
        assert!(matches!(err, FrameError::Ambiguous));
    }

    #[test]
    fn test_unknown_frame_rejected() {
        let err = Frame::parse(r#"{"params":{}}"#).unwrap_err();
        assert!(matches!(err, FrameError::Unknown));
    }

    #[test]
    fn test_malformed_frame_rejected() {
        assert!(matches!(Frame::parse("{not json").unwrap_err(), FrameError::Malformed(_)));
        assert!(matches!(Frame::parse("[1,2]").unwrap_err(), FrameError::NotAnObject));
    }

    #[test]
    fn test_invalid_id_and_method() {
        assert!(matches!(
            Frame::parse(r#"{"id":"abc","result":{}}"#).unwrap_err(),
            FrameError::InvalidId(_)
        ));
        assert!(matches!(
            Frame::parse(r#"{"id":0,"result":{}}"#).unwrap_err(),
            FrameError::InvalidId(_)
        ));
        assert!(matches!(
            Frame::parse(r#"{"method":5}"#).unwrap_err(),
            FrameError::InvalidMethod(_)
        ));
    }

    #[test]
    fn test_null_keys_count_as_absent() {
        let frame = Frame::parse(r#"{"id":3,"method":null,"result":{}}"#).expect("classify");
        assert!(matches!(frame, Frame::Reply { .. }));
    }

    #[test]
    fn test_reply_into_result() {
        let ok = Reply::from_value(&json!({"id": 1, "result": {"v": 42}})).expect("decode");
        assert!(!ok.is_error());
        assert_eq!(ok.into_result("A.one").expect("ok")["v"], 42);

        let empty = Reply::from_value(&json!({"id": 1})).expect("decode");
        assert_eq!(empty.into_result("A.one").expect("ok"), Value::Null);
    }

    #[test]
    fn test_reply_error_into_result() {
        let reply = Reply::from_value(&json!({"id": 7, "error": {"code": -1, "message": "boom"}}))
            .expect("decode");
        assert!(reply.is_error());

        let err = reply.into_result("Debugger.pause").unwrap_err();
        match err {
            Error::CommandFailed {
                method,
                code,
                message,
                ..
            } => {
                assert_eq!(method, "Debugger.pause");
                assert_eq!(code, -1);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! The child's line-delimited JSON wire protocol.
//!
//! The CLI we launch emits one JSON object per line. The `type` field
//! selects the variant; everything else is passed through even for types
//! we don't recognize, so a host built against a newer CLI build doesn't
//! lose data it might still want to log.

use serde::de::Error as _;
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolUseStatus {
    Pending,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseState {
    pub input: Value,
    #[serde(default)]
    pub output: Option<Value>,
    pub status: ToolUseStatus,
}

/// The reason a model turn ended. Only [`Self::Stop`] and [`Self::EndTurn`]
/// are terminal as far as the completion protocol is concerned; every other
/// reason (including ones this crate has never seen) is preserved verbatim
/// in [`Self::Other`] rather than collapsed to a generic "unknown" value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFinishReason {
    Stop,
    EndTurn,
    Error,
    Other(String),
}

impl StepFinishReason {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop | Self::EndTurn)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::EndTurn => "end_turn",
            Self::Error => "error",
            Self::Other(raw) => raw,
        }
    }
}

impl<'de> Deserialize<'de> for StepFinishReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "stop" => Self::Stop,
            "end_turn" => Self::EndTurn,
            "error" => Self::Error,
            _ => Self::Other(raw),
        })
    }
}

impl Serialize for StepFinishReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One line of the child's NDJSON stream, decoded. [`Self::Unknown`] is the
/// catch-all for `type` values this crate does not recognize: the stream
/// parser still emits these (per its validation rule) rather than treating
/// them as errors, since a newer CLI build may add message kinds a host
/// wants to log even if it can't act on them.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolMessage {
    StepStart {
        session_id: String,
    },
    Text {
        text: String,
        session_id: Option<String>,
    },
    ToolCall {
        tool: String,
        input: Value,
        session_id: Option<String>,
    },
    ToolUse {
        tool: String,
        state: ToolUseState,
        session_id: Option<String>,
    },
    ToolResult {
        output: String,
    },
    StepFinish {
        reason: StepFinishReason,
        tokens: Option<Value>,
        cost: Option<f64>,
    },
    Error {
        error: String,
    },
    Unknown {
        raw: Value,
    },
}

impl ProtocolMessage {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StepStart { .. } => "step_start",
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
            Self::StepFinish { .. } => "step_finish",
            Self::Error { .. } => "error",
            Self::Unknown { .. } => "unknown",
        }
    }
}

// Internal helper shapes matching the wire field names exactly (including
// the child's `sessionID` capitalization, which does not match this
// crate's `snake_case` convention). Kept private: nothing outside this
// module should depend on the wire shape directly.
#[derive(Deserialize)]
struct StepStartWire {
    #[serde(rename = "sessionID")]
    session_id: String,
}

#[derive(Deserialize)]
struct TextWire {
    text: String,
    #[serde(rename = "sessionID", default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct ToolCallWire {
    tool: String,
    #[serde(default)]
    input: Value,
    #[serde(rename = "sessionID", default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct ToolUseWire {
    tool: String,
    state: ToolUseState,
    #[serde(rename = "sessionID", default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct ToolResultWire {
    output: String,
}

#[derive(Deserialize)]
struct StepFinishWire {
    reason: StepFinishReason,
    #[serde(default)]
    tokens: Option<Value>,
    #[serde(default)]
    cost: Option<f64>,
}

#[derive(Deserialize)]
struct ErrorWire {
    error: String,
}

impl<'de> Deserialize<'de> for ProtocolMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let type_name = value.get("type").and_then(Value::as_str).unwrap_or("");

        macro_rules! decode {
            ($wire:ty) => {
                serde_json::from_value::<$wire>(value.clone()).map_err(D::Error::custom)
            };
        }

        match type_name {
            "step_start" => decode!(StepStartWire).map(|w| Self::StepStart {
                session_id: w.session_id,
            }),
            "text" => decode!(TextWire).map(|w| Self::Text {
                text: w.text,
                session_id: w.session_id,
            }),
            "tool_call" => decode!(ToolCallWire).map(|w| Self::ToolCall {
                tool: w.tool,
                input: w.input,
                session_id: w.session_id,
            }),
            "tool_use" => decode!(ToolUseWire).map(|w| Self::ToolUse {
                tool: w.tool,
                state: w.state,
                session_id: w.session_id,
            }),
            "tool_result" => decode!(ToolResultWire).map(|w| Self::ToolResult { output: w.output }),
            "step_finish" => decode!(StepFinishWire).map(|w| Self::StepFinish {
                reason: w.reason,
                tokens: w.tokens,
                cost: w.cost,
            }),
            "error" => decode!(ErrorWire).map(|w| Self::Error { error: w.error }),
            _ => Ok(Self::Unknown { raw: value }),
        }
    }
}

impl Serialize for ProtocolMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_name())?;
        match self {
            Self::StepStart { session_id } => {
                map.serialize_entry("sessionID", session_id)?;
            }
            Self::Text { text, session_id } => {
                map.serialize_entry("text", text)?;
                map.serialize_entry("sessionID", session_id)?;
            }
            Self::ToolCall {
                tool,
                input,
                session_id,
            } => {
                map.serialize_entry("tool", tool)?;
                map.serialize_entry("input", input)?;
                map.serialize_entry("sessionID", session_id)?;
            }
            Self::ToolUse {
                tool,
                state,
                session_id,
            } => {
                map.serialize_entry("tool", tool)?;
                map.serialize_entry("state", state)?;
                map.serialize_entry("sessionID", session_id)?;
            }
            Self::ToolResult { output } => {
                map.serialize_entry("output", output)?;
            }
            Self::StepFinish {
                reason,
                tokens,
                cost,
            } => {
                map.serialize_entry("reason", reason)?;
                map.serialize_entry("tokens", tokens)?;
                map.serialize_entry("cost", cost)?;
            }
            Self::Error { error } => {
                map.serialize_entry("error", error)?;
            }
            Self::Unknown { raw } => {
                if let Value::Object(fields) = raw {
                    for (k, v) in fields {
                        if k != "type" {
                            map.serialize_entry(k, v)?;
                        }
                    }
                }
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_step_start() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"step_start","sessionID":"s1"}"#).unwrap();
        assert_eq!(
            msg,
            ProtocolMessage::StepStart {
                session_id: "s1".to_string()
            }
        );
    }

    #[test]
    fn decodes_text() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"text","text":"ok","sessionID":"s"}"#).unwrap();
        assert_eq!(
            msg,
            ProtocolMessage::Text {
                text: "ok".to_string(),
                session_id: Some("s".to_string())
            }
        );
    }

    #[test]
    fn decodes_step_finish_with_known_reason() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"step_finish","reason":"stop"}"#).unwrap();
        match msg {
            ProtocolMessage::StepFinish { reason, .. } => {
                assert!(reason.is_terminal());
                assert_eq!(reason, StepFinishReason::Stop);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn preserves_unknown_step_finish_reason() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"step_finish","reason":"rate_limited"}"#).unwrap();
        match msg {
            ProtocolMessage::StepFinish { reason, .. } => {
                assert!(!reason.is_terminal());
                assert_eq!(reason, StepFinishReason::Other("rate_limited".to_string()));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_type_becomes_unknown() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"future_event","foo":1}"#).unwrap();
        assert!(matches!(msg, ProtocolMessage::Unknown { .. }));
    }

    #[test]
    fn tool_use_state_round_trips() {
        let msg: ProtocolMessage = serde_json::from_str(
            r#"{"type":"tool_use","tool":"bash","state":{"input":{"cmd":"ls"},"output":"ok","status":"completed"},"sessionID":"s"}"#,
        )
        .unwrap();
        match msg {
            ProtocolMessage::ToolUse { state, .. } => {
                assert_eq!(state.status, ToolUseStatus::Completed);
                assert_eq!(state.output, Some(Value::String("ok".to_string())));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

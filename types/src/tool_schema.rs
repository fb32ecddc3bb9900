//! The argument shapes of the three tools the completion protocol and the
//! adapter's message dispatch understand by name: `complete_task`,
//! `todowrite`, and `start_task`. These are deserialized out of a
//! `tool_call`/`tool_use`'s opaque `input` value once the tool name has
//! been classified (see `overseer_classify::classify_tool`).

use serde::de::Error as _;
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::todo::{TodoPriority, TodoStatus};

/// The model's self-reported outcome of a `complete_task` call. Only
/// [`Self::Success`] and [`Self::Partial`] drive distinct completion-protocol
/// transitions; everything else — including the documented `"blocked"`
/// value — is treated as a terminal, non-retrying claim, but the original
/// string is preserved in [`Self::Other`] for display/logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteTaskStatus {
    Success,
    Partial,
    Blocked,
    Other(String),
}

impl CompleteTaskStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "partial" => Self::Partial,
            "blocked" => Self::Blocked,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Blocked => "blocked",
            Self::Other(raw) => raw,
        }
    }
}

impl<'de> Deserialize<'de> for CompleteTaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::parse(&String::deserialize(deserializer)?))
    }
}

impl Serialize for CompleteTaskStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// `complete_task({status, summary, original_request_summary, remaining_work?})`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTaskArgs {
    pub status: CompleteTaskStatus,
    pub summary: String,
    pub original_request_summary: String,
    #[serde(default)]
    pub remaining_work: Option<String>,
}

impl CompleteTaskArgs {
    /// Parse a `complete_task` tool call's JSON input. Returns `Err` with a
    /// diagnostic message rather than panicking; a malformed call from the
    /// model is a runtime occurrence, not a programming bug.
    pub fn from_input(input: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(input.clone()).map_err(|err| {
            serde_json::Error::custom(format!("invalid complete_task arguments: {err}"))
        })
    }
}

/// One entry of a `todowrite({todos: [...]})` call. `id` and `status`/
/// `priority` are optional on the wire: a missing id is synthesized by the
/// adapter (see `TodoId::synthesize`), a missing status defaults to
/// `pending`, a missing priority defaults to `medium`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TodoWriteEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub priority: Option<TodoPriority>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TodoWriteArgs {
    pub todos: Vec<TodoWriteEntry>,
}

impl TodoWriteArgs {
    pub fn from_input(input: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(input.clone())
            .map_err(|err| serde_json::Error::custom(format!("invalid todowrite arguments: {err}")))
    }
}

/// `start_task({original_request, needs_planning, goal?, steps?, verification?, skills})`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartTaskArgs {
    pub original_request: String,
    #[serde(default)]
    pub needs_planning: bool,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub verification: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl StartTaskArgs {
    pub fn from_input(input: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(input.clone())
            .map_err(|err| serde_json::Error::custom(format!("invalid start_task arguments: {err}")))
    }
}

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attachment::Attachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Assistant,
    Tool,
    System,
}

/// A single immutable entry in a task's message history, in the order the
/// child emitted it. The embedding host always receives a clone of one of
/// these, never a reference into the adapter's owned history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
    pub attachments: Vec<Attachment>,
    pub timestamp: SystemTime,
}

impl TaskMessage {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            tool_name: None,
            tool_input: None,
            attachments: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool_name: impl Into<String>, tool_input: Option<Value>) -> Self {
        self.tool_name = Some(tool_name.into());
        self.tool_input = tool_input;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

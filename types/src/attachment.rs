use serde::{Deserialize, Serialize};

/// Something extracted out of a tool's textual output and promoted to a
/// first-class part of a message, rather than left inline as a base64 blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Screenshot,
    Json,
}

/// An attachment extracted from a tool output. `data` holds the original
/// payload (base64 for screenshots, raw text for JSON) verbatim; the
/// textual content it was pulled from is left with a placeholder in its
/// place (see `overseer_classify::sanitize`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub data: String,
    pub label: Option<String>,
}

impl Attachment {
    #[must_use]
    pub fn screenshot(data: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Screenshot,
            data: data.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn json(data: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Json,
            data: data.into(),
            label: Some(label.into()),
        }
    }
}

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{PermissionId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    Create,
    Overwrite,
    Modify,
    Delete,
    Rename,
    Move,
}

/// A request raised by a running task that the host must resolve (grant or
/// deny) before the adapter can proceed, surfaced via `on_permission_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermissionRequest {
    Tool {
        id: PermissionId,
        task_id: TaskId,
        tool_name: String,
        tool_input: Value,
        created_at: SystemTime,
    },
    File {
        id: PermissionId,
        task_id: TaskId,
        file_operation: FileOperation,
        file_path: PathBuf,
        target_path: Option<PathBuf>,
        content_preview: Option<String>,
        created_at: SystemTime,
    },
}

impl PermissionRequest {
    #[must_use]
    pub fn id(&self) -> &PermissionId {
        match self {
            Self::Tool { id, .. } | Self::File { id, .. } => id,
        }
    }

    #[must_use]
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::Tool { task_id, .. } | Self::File { task_id, .. } => task_id,
        }
    }
}

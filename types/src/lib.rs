//! Core domain types for the overseer task supervisor.
//!
//! This crate contains pure domain types with no IO and no async runtime
//! dependency. Everything here can be used from any layer of the
//! supervisor (parser, classifier, enforcer, adapter, task manager) or by
//! an embedding host.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod attachment;
mod host;
mod ids;
mod message;
mod nonempty;
mod permission;
mod progress;
mod protocol;
mod status;
mod task;
mod todo;
mod tool_schema;

pub use attachment::{Attachment, AttachmentKind};
pub use host::{HostCapabilities, NullTaskCallbacks, TaskCallbacks};
pub use ids::{PermissionId, TaskId, TodoId};
pub use message::{MessageKind, TaskMessage};
pub use nonempty::{EmptyStringError, NonEmptyString};
pub use permission::{FileOperation, PermissionRequest};
pub use progress::ProgressStage;
pub use protocol::{ProtocolMessage, StepFinishReason, ToolUseState, ToolUseStatus};
pub use status::TaskStatus;
pub use task::{Task, TaskConfig};
pub use todo::{TodoItem, TodoPriority, TodoStatus};
pub use tool_schema::{
    CompleteTaskArgs, CompleteTaskStatus, StartTaskArgs, TodoWriteArgs, TodoWriteEntry,
};

//! Task manager: concurrency limit, FIFO queue, per-task bookkeeping,
//! cancellation, cleanup and queue drain for the agent task supervisor.
//! The public facade an embedding host actually holds onto; everything
//! else in this workspace is a collaborator this crate wires together.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod config;
mod error;
mod manager;

pub use config::TaskManagerConfig;
pub use error::TaskManagerError;
pub use manager::TaskManager;

// Re-exported so a host depending only on `overseer-core` has everything
// it needs to implement `HostCapabilities`/`TaskCallbacks` and construct
// tasks, without a separate dependency on `overseer-types`/`overseer-adapter`.
pub use overseer_adapter::AdapterConfig;
pub use overseer_types::{
    Attachment, AttachmentKind, CompleteTaskArgs, CompleteTaskStatus, FileOperation, HostCapabilities, MessageKind,
    NonEmptyString, NullTaskCallbacks, PermissionRequest, ProgressStage, StartTaskArgs, StepFinishReason, Task,
    TaskCallbacks, TaskConfig, TaskId, TaskMessage, TaskStatus, TodoItem, TodoPriority, TodoStatus, TodoWriteArgs,
};

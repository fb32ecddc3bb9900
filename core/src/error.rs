use thiserror::Error;

/// Admission and lookup failures returned synchronously from
/// [`crate::TaskManager`]'s entry points. Runtime failures that happen
/// once a task is already running (a child crashing, an auth failure,
/// an invalid protocol transition) never become one of these. They
/// surface exactly once through that task's own `on_error` callback
/// followed by a terminal `Failed` status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskManagerError {
    #[error("a task with this id is already active or queued")]
    DuplicateTask,

    #[error("the task queue is full")]
    QueueFull,

    #[error("the CLI is not available")]
    CliMissing,

    #[error("no task with this id is active or queued")]
    TaskNotFound,

    #[error("the task is not currently active")]
    TaskNotActive,

    #[error("the task manager has been disposed")]
    Disposed,
}

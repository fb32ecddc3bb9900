//! The boundary traits between this supervisor and the process embedding
//! it: what the host must supply ([`HostCapabilities`]) and what the host
//! is told ([`TaskCallbacks`]). Living in this crate (rather than
//! `overseer-core` or `overseer-adapter`) lets both the adapter, which
//! spawns the child directly, and the task manager, which only forwards
//! to the adapter, depend on the same trait objects without a cycle.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::ids::TaskId;
use crate::progress::ProgressStage;
use crate::status::TaskStatus;
use crate::task::TaskConfig;
use crate::todo::TodoItem;
use crate::{Attachment, PermissionRequest, TaskMessage};

/// Capabilities the embedding host supplies at construction. This is the
/// supervisor's entire configuration surface: there is no file-based
/// config layer here, since persisting and loading that configuration is
/// the host's job, not this crate's.
pub trait HostCapabilities: Send + Sync {
    /// Absolute path to the CLI executable and its static prefix args.
    fn cli_command(&self) -> (PathBuf, Vec<String>);

    /// Dynamic arguments derived from a task's configuration (prompt,
    /// `--session-id`, `--model`, ...).
    fn build_cli_args(&self, config: &TaskConfig) -> Vec<String>;

    /// Full environment for the child process, including provider
    /// credentials and a bundled-runtime `PATH` prefix.
    fn build_environment(&self, task_id: &TaskId) -> HashMap<String, String>;

    /// Cheap probe for whether the CLI can be spawned at all, consulted
    /// at task admission before any process is spawned.
    fn is_cli_available(&self) -> bool;

    /// Runs once per child spawn (including continuation/verification
    /// respawns), before the process is started.
    fn on_before_start(&self) {}

    /// Runs once per task before its first spawn. `is_first_task` is true
    /// only for the very first task this host has ever started.
    fn on_before_task_start(&self, _callbacks: &dyn TaskCallbacks, _is_first_task: bool) {}

    /// Human-readable label for a model id, used only in progress
    /// messages; `None` falls back to the raw id.
    fn model_display_name(&self, _model_id: &str) -> Option<String> {
        None
    }
}

/// Lifecycle events the supervisor reports back to the embedding host.
/// Every method is a plain callback: the supervisor never blocks waiting
/// for a return value from any of these except implicitly through
/// `&dyn TaskCallbacks` being called synchronously on the task's own
/// tokio task (so a slow host callback only delays its own task).
pub trait TaskCallbacks: Send + Sync {
    fn on_message(&self, task_id: &TaskId, message: &TaskMessage);
    fn on_progress(&self, task_id: &TaskId, stage: ProgressStage);
    fn on_permission_request(&self, task_id: &TaskId, request: &PermissionRequest);
    fn on_complete(&self, task_id: &TaskId, status: TaskStatus);
    fn on_error(&self, task_id: &TaskId, message: &str);
    fn on_status_change(&self, task_id: &TaskId, status: TaskStatus);
    fn on_debug(&self, task_id: &TaskId, line: &str);
    fn on_todo_update(&self, task_id: &TaskId, todos: &[TodoItem]);
    fn on_auth_error(&self, task_id: &TaskId, provider_id: &str, message: &str);

    /// Called once a task's session id is known (the child's first
    /// `step_start`). Default no-op: most hosts don't need to track the
    /// session id directly and can read it off their own `Task` snapshot
    /// via `TaskManager::get_task` instead.
    fn on_session_id(&self, _task_id: &TaskId, _session_id: &str) {}

    /// Called when an attachment (e.g. an extracted screenshot) should be
    /// surfaced alongside a message. Default no-op: most hosts read
    /// attachments off the `TaskMessage` passed to `on_message` instead,
    /// but the separate hook exists for hosts that stream attachments
    /// out of band (large payloads, different transport).
    fn on_attachment(&self, _task_id: &TaskId, _attachment: &Attachment) {}
}

/// A no-op [`TaskCallbacks`] implementation, useful for tests and for a
/// host that only cares about a subset of events (wrap this and override).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTaskCallbacks;

impl TaskCallbacks for NullTaskCallbacks {
    fn on_message(&self, _task_id: &TaskId, _message: &TaskMessage) {}
    fn on_progress(&self, _task_id: &TaskId, _stage: ProgressStage) {}
    fn on_permission_request(&self, _task_id: &TaskId, _request: &PermissionRequest) {}
    fn on_complete(&self, _task_id: &TaskId, _status: TaskStatus) {}
    fn on_error(&self, _task_id: &TaskId, _message: &str) {}
    fn on_status_change(&self, _task_id: &TaskId, _status: TaskStatus) {}
    fn on_debug(&self, _task_id: &TaskId, _line: &str) {}
    fn on_todo_update(&self, _task_id: &TaskId, _todos: &[TodoItem]) {}
    fn on_auth_error(&self, _task_id: &TaskId, _provider_id: &str, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHost;

    impl HostCapabilities for FakeHost {
        fn cli_command(&self) -> (PathBuf, Vec<String>) {
            (PathBuf::from("/usr/bin/fake-cli"), vec![])
        }

        fn build_cli_args(&self, config: &TaskConfig) -> Vec<String> {
            vec!["--prompt".to_string(), config.prompt.as_str().to_string()]
        }

        fn build_environment(&self, task_id: &TaskId) -> HashMap<String, String> {
            HashMap::from([("TASK_ID".to_string(), task_id.to_string())])
        }

        fn is_cli_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn default_methods_are_harmless_no_ops() {
        let host = FakeHost;
        assert!(host.is_cli_available());
        assert_eq!(host.model_display_name("gpt"), None);
        host.on_before_start();
    }

    #[test]
    fn null_callbacks_accept_every_event() {
        let callbacks = NullTaskCallbacks;
        let task_id = TaskId::new("t1");
        callbacks.on_progress(&task_id, ProgressStage::Starting);
        callbacks.on_status_change(&task_id, TaskStatus::Running);
    }
}

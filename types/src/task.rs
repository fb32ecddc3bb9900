use std::path::PathBuf;
use std::time::SystemTime;

use crate::ids::TaskId;
use crate::nonempty::NonEmptyString;
use crate::status::TaskStatus;

/// Configuration a host supplies when starting a task: the prompt plus
/// the optional knobs [`crate::ProtocolMessage`] and the adapter need to
/// build CLI arguments (`--session-id`, `--model`).
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub prompt: NonEmptyString,
    pub working_directory: PathBuf,
    pub model: Option<String>,
    /// Present when this task is resuming a prior session rather than
    /// starting fresh (set by the host for a long-lived conversation, not
    /// by the enforcer's own continuation/verification respawns, which
    /// reuse [`Task::session_id`] directly).
    pub resume_session_id: Option<String>,
}

impl TaskConfig {
    #[must_use]
    pub fn new(prompt: NonEmptyString, working_directory: PathBuf) -> Self {
        Self {
            prompt,
            working_directory,
            model: None,
            resume_session_id: None,
        }
    }
}

/// A single end-to-end invocation of the AI CLI in service of one user
/// prompt.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub prompt: NonEmptyString,
    pub status: TaskStatus,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    /// Opaque id issued by the child once it connects (`step_start`).
    /// Monotonically assigned: once `Some`, never reassigned for this
    /// task.
    pub session_id: Option<String>,
    pub working_directory: PathBuf,
}

impl Task {
    #[must_use]
    pub fn new(id: TaskId, config: &TaskConfig, created_at: SystemTime) -> Self {
        Self {
            id,
            prompt: config.prompt.clone(),
            status: TaskStatus::Queued,
            created_at,
            started_at: None,
            session_id: config.resume_session_id.clone(),
            working_directory: config.working_directory.clone(),
        }
    }

    /// Assign the session id the child reported on its first `step_start`.
    ///
    /// Panics in debug builds if called twice with a different value,
    /// since `session_id` is supposed to be monotonically assigned; in
    /// release builds the first assignment simply wins.
    pub fn assign_session_id(&mut self, session_id: String) {
        if let Some(existing) = &self.session_id {
            debug_assert_eq!(
                existing, &session_id,
                "session_id must not be reassigned once set"
            );
            return;
        }
        self.session_id = Some(session_id);
    }
}

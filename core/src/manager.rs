//! The task manager: the single mutator of the active-task map and the
//! FIFO queue. Every public entry point takes a plain [`std::sync::Mutex`]
//! briefly to read or mutate that shared state, then releases it before
//! doing anything that talks to the host or spawns a child — mirroring
//! the adapter's own rule that its run loop is the only thing that ever
//! touches its pty writer or child guard, just one layer up.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use overseer_adapter::{spawn_adapter, AdapterConfig, AdapterHandle};
use overseer_types::{
    Attachment, HostCapabilities, PermissionRequest, ProgressStage, Task, TaskCallbacks, TaskConfig, TaskId,
    TaskMessage, TaskStatus, TodoItem,
};
use tracing::{debug, warn};

use crate::config::TaskManagerConfig;
use crate::error::TaskManagerError;

/// One task the manager currently owns the resources for (either running
/// or about to be): its bookkeeping record plus the adapter handle once
/// spawning has actually happened.
struct ActiveEntry {
    task: Task,
    handle: Option<AdapterHandle>,
    /// Set when `cancel_task` arrives before the adapter has finished
    /// spawning; consulted once the handle is installed so the cancel
    /// isn't lost to the race.
    cancel_requested: bool,
}

struct QueuedEntry {
    task: Task,
    config: TaskConfig,
    callbacks: Arc<dyn TaskCallbacks>,
}

#[derive(Default)]
struct ManagerState {
    active: HashMap<TaskId, ActiveEntry>,
    queue: VecDeque<QueuedEntry>,
}

/// Shared, `Arc`-held half of the manager: everything a spawned execution
/// task needs to outlive the call that spawned it.
struct ManagerCore {
    host: Arc<dyn HostCapabilities>,
    adapter_config: AdapterConfig,
    config: TaskManagerConfig,
    state: Mutex<ManagerState>,
    first_task_started: AtomicBool,
    disposed: AtomicBool,
}

/// Concurrency limit, FIFO queue, per-task bookkeeping, cancellation,
/// cleanup and queue drain for the agent task supervisor.
///
/// Cheap to clone: cloning shares the same underlying state (it's an
/// `Arc` internally), the way a `tokio::sync::mpsc::Sender` is cheap to
/// clone. A host typically keeps one instance for its whole process
/// lifetime.
#[derive(Clone)]
pub struct TaskManager {
    core: Arc<ManagerCore>,
}

impl TaskManager {
    #[must_use]
    pub fn new(host: Arc<dyn HostCapabilities>, config: TaskManagerConfig, adapter_config: AdapterConfig) -> Self {
        Self {
            core: Arc::new(ManagerCore {
                host,
                adapter_config,
                config,
                state: Mutex::new(ManagerState::default()),
                first_task_started: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Admit a new task. Returns its initial record (`Running` if it was
    /// admitted straight to execution, `Queued` if the concurrency cap
    /// was already saturated). The actual child spawn, if any, happens on
    /// a freshly spawned tokio task — this call never awaits a process.
    pub fn start_task(
        &self,
        task_id: TaskId,
        task_config: TaskConfig,
        callbacks: Arc<dyn TaskCallbacks>,
    ) -> Result<Task, TaskManagerError> {
        if self.core.disposed.load(Ordering::SeqCst) {
            return Err(TaskManagerError::Disposed);
        }
        if !self.core.host.is_cli_available() {
            return Err(TaskManagerError::CliMissing);
        }

        let created_at = SystemTime::now();
        let mut task = Task::new(task_id.clone(), &task_config, created_at);
        let mut execute = false;

        {
            let mut state = self.core.state.lock().expect("task manager state lock poisoned");
            if state.active.contains_key(&task_id) || state.queue.iter().any(|q| q.task.id == task_id) {
                return Err(TaskManagerError::DuplicateTask);
            }

            if state.active.len() < self.core.config.concurrency_limit {
                task.status = TaskStatus::Running;
                task.started_at = Some(created_at);
                state.active.insert(
                    task_id.clone(),
                    ActiveEntry {
                        task: task.clone(),
                        handle: None,
                        cancel_requested: false,
                    },
                );
                execute = true;
            } else if state.queue.len() < self.core.config.queue_limit {
                state.queue.push_back(QueuedEntry {
                    task: task.clone(),
                    config: task_config.clone(),
                    callbacks: callbacks.clone(),
                });
            } else {
                return Err(TaskManagerError::QueueFull);
            }
        }

        if execute {
            let is_first_task = !self.core.first_task_started.swap(true, Ordering::SeqCst);
            spawn_execution(self.core.clone(), task_id, task_config, callbacks, is_first_task);
        }

        Ok(task)
    }

    /// Remove a queued task synchronously (it is never promoted), or
    /// request the active adapter kill its child. Either way the task's
    /// terminal status (if any) is `Cancelled`; a cancel that loses a
    /// race with a natural completion is a no-op, since the adapter's own
    /// `terminal_emitted` guard only ever lets the first terminal event
    /// through.
    pub fn cancel_task(&self, task_id: &TaskId) -> Result<(), TaskManagerError> {
        let mut state = self.core.state.lock().expect("task manager state lock poisoned");
        if let Some(pos) = state.queue.iter().position(|q| &q.task.id == task_id) {
            state.queue.remove(pos);
            return Ok(());
        }
        if let Some(entry) = state.active.get_mut(task_id) {
            entry.cancel_requested = true;
            if let Some(handle) = &entry.handle {
                let _ = handle.cancel();
            }
            return Ok(());
        }
        Err(TaskManagerError::TaskNotFound)
    }

    /// Cooperative interrupt: only meaningful for an already-running task
    /// (its adapter writes `Ctrl-C` to the pseudoterminal); does not
    /// trigger cleanup itself, since the child may still complete
    /// successfully after reacting to the interrupt.
    pub fn interrupt_task(&self, task_id: &TaskId) -> Result<(), TaskManagerError> {
        let state = self.core.state.lock().expect("task manager state lock poisoned");
        let entry = state.active.get(task_id).ok_or(TaskManagerError::TaskNotFound)?;
        let handle = entry.handle.as_ref().ok_or(TaskManagerError::TaskNotActive)?;
        handle.interrupt().map_err(|_| TaskManagerError::TaskNotActive)
    }

    /// Write a line of text to a running task's child. Fails if the task
    /// is not active (queued, unknown, or not yet past its first spawn).
    pub fn send_response(&self, task_id: &TaskId, text: impl Into<String>) -> Result<(), TaskManagerError> {
        let state = self.core.state.lock().expect("task manager state lock poisoned");
        let entry = state.active.get(task_id).ok_or(TaskManagerError::TaskNotFound)?;
        let handle = entry.handle.as_ref().ok_or(TaskManagerError::TaskNotActive)?;
        handle.send_response(text.into()).map_err(|_| TaskManagerError::TaskNotActive)
    }

    /// Snapshot of one task's bookkeeping record, if it is still active or
    /// queued. A task that has already reached a terminal status has been
    /// destroyed along with its adapter and is no longer visible here.
    #[must_use]
    pub fn get_task(&self, task_id: &TaskId) -> Option<Task> {
        let state = self.core.state.lock().expect("task manager state lock poisoned");
        state
            .active
            .get(task_id)
            .map(|entry| entry.task.clone())
            .or_else(|| state.queue.iter().find(|q| &q.task.id == task_id).map(|q| q.task.clone()))
    }

    /// Snapshot of every active or queued task's bookkeeping record.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.core.state.lock().expect("task manager state lock poisoned");
        state
            .active
            .values()
            .map(|entry| entry.task.clone())
            .chain(state.queue.iter().map(|q| q.task.clone()))
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.core.state.lock().expect("task manager state lock poisoned").active.len()
    }

    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.core.state.lock().expect("task manager state lock poisoned").queue.len()
    }

    /// Cancel every queued task without emitting any events for them, and
    /// request cleanup (a kill) for every active one. Does not wait for
    /// that cleanup to finish; each adapter's own completion path still
    /// runs and still delivers its single terminal event.
    pub fn dispose(&self) {
        self.core.disposed.store(true, Ordering::SeqCst);
        let mut state = self.core.state.lock().expect("task manager state lock poisoned");
        state.queue.clear();
        for entry in state.active.values() {
            if let Some(handle) = &entry.handle {
                let _ = handle.cancel();
            }
        }
    }
}

/// Spawn a task's adapter (or a just-promoted queued task's) on its own
/// tokio task, then await its completion and drain the queue once it's
/// gone. `is_first_task` is only ever `true` once per manager, across the
/// entire fleet of tasks it ever starts.
fn spawn_execution(
    core: Arc<ManagerCore>,
    task_id: TaskId,
    task_config: TaskConfig,
    callbacks: Arc<dyn TaskCallbacks>,
    is_first_task: bool,
) {
    tokio::spawn(async move {
        // Runs once per task, before its first spawn -- distinct from
        // `on_before_start`, which the adapter itself calls on every
        // spawn, including continuation/verification respawns.
        core.host.on_before_task_start(callbacks.as_ref(), is_first_task);

        let tracking: Arc<dyn TaskCallbacks> = Arc::new(TrackingCallbacks {
            core: core.clone(),
            task_id: task_id.clone(),
            inner: callbacks,
        });

        let (handle, join) = spawn_adapter(
            task_id.clone(),
            core.host.clone(),
            tracking,
            task_config,
            core.adapter_config.clone(),
        );

        let should_cancel = {
            let mut state = core.state.lock().expect("task manager state lock poisoned");
            if let Some(entry) = state.active.get_mut(&task_id) {
                let requested = entry.cancel_requested;
                entry.handle = Some(handle.clone());
                requested
            } else {
                false
            }
        };
        if should_cancel {
            let _ = handle.cancel();
        }

        let status = match join.await {
            Ok(status) => status,
            Err(err) => {
                warn!(%task_id, %err, "adapter task panicked or was aborted");
                TaskStatus::Failed
            }
        };
        debug!(%task_id, ?status, "task finished, cleaning up");

        on_task_finished(core, task_id);
    });
}

/// Tear down the finished task's active-map entry and promote as many
/// queued tasks into execution as the concurrency cap now allows,
/// emitting each promotion's `status_change(Running)` before its adapter
/// gets a chance to emit anything of its own.
fn on_task_finished(core: Arc<ManagerCore>, task_id: TaskId) {
    let mut promotions = Vec::new();
    {
        let mut state = core.state.lock().expect("task manager state lock poisoned");
        state.active.remove(&task_id);
        while state.active.len() < core.config.concurrency_limit {
            let Some(queued) = state.queue.pop_front() else {
                break;
            };
            let mut task = queued.task;
            task.status = TaskStatus::Running;
            task.started_at = Some(SystemTime::now());
            state.active.insert(
                task.id.clone(),
                ActiveEntry {
                    task: task.clone(),
                    handle: None,
                    cancel_requested: false,
                },
            );
            promotions.push((task, queued.config, queued.callbacks));
        }
    }

    for (task, config, callbacks) in promotions {
        callbacks.on_status_change(&task.id, TaskStatus::Running);
        let is_first_task = !core.first_task_started.swap(true, Ordering::SeqCst);
        spawn_execution(core.clone(), task.id, config, callbacks, is_first_task);
    }
}

/// Forwards every [`TaskCallbacks`] event to the host-supplied callbacks
/// unchanged, while mirroring status changes into the manager's own
/// bookkeeping record so `get_task`/`tasks` stay live without the host
/// having to round-trip through its own `on_status_change` handler.
struct TrackingCallbacks {
    core: Arc<ManagerCore>,
    task_id: TaskId,
    inner: Arc<dyn TaskCallbacks>,
}

impl TaskCallbacks for TrackingCallbacks {
    fn on_message(&self, task_id: &TaskId, message: &TaskMessage) {
        self.inner.on_message(task_id, message);
    }

    fn on_progress(&self, task_id: &TaskId, stage: ProgressStage) {
        self.inner.on_progress(task_id, stage);
    }

    fn on_permission_request(&self, task_id: &TaskId, request: &PermissionRequest) {
        self.inner.on_permission_request(task_id, request);
    }

    fn on_complete(&self, task_id: &TaskId, status: TaskStatus) {
        self.inner.on_complete(task_id, status);
    }

    fn on_error(&self, task_id: &TaskId, message: &str) {
        self.inner.on_error(task_id, message);
    }

    fn on_status_change(&self, task_id: &TaskId, status: TaskStatus) {
        debug_assert_eq!(task_id, &self.task_id);
        if let Ok(mut state) = self.core.state.lock() {
            if let Some(entry) = state.active.get_mut(task_id) {
                entry.task.status = status;
            }
        }
        self.inner.on_status_change(task_id, status);
    }

    fn on_debug(&self, task_id: &TaskId, line: &str) {
        self.inner.on_debug(task_id, line);
    }

    fn on_todo_update(&self, task_id: &TaskId, todos: &[TodoItem]) {
        self.inner.on_todo_update(task_id, todos);
    }

    fn on_auth_error(&self, task_id: &TaskId, provider_id: &str, message: &str) {
        self.inner.on_auth_error(task_id, provider_id, message);
    }

    fn on_session_id(&self, task_id: &TaskId, session_id: &str) {
        if let Ok(mut state) = self.core.state.lock() {
            if let Some(entry) = state.active.get_mut(task_id) {
                entry.task.assign_session_id(session_id.to_string());
            }
        }
        self.inner.on_session_id(task_id, session_id);
    }

    fn on_attachment(&self, task_id: &TaskId, attachment: &Attachment) {
        self.inner.on_attachment(task_id, attachment);
    }
}

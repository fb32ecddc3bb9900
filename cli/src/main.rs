//! Demo/integration harness: wires the bundled fixture script up as an
//! `HostCapabilities` implementation and drives one task through
//! `overseer_core::TaskManager` end to end, printing every lifecycle
//! event as it arrives. Not a real product surface -- a manual-test tool
//! and a reference for how a real embedding host would use this crate.

mod demo_host;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use overseer_core::{
    Attachment, NonEmptyString, PermissionRequest, ProgressStage, TaskCallbacks, TaskConfig, TaskId, TaskManager,
    TaskManagerConfig, TaskMessage, TaskStatus, TodoItem,
};
use tracing_subscriber::{fmt, EnvFilter};

use demo_host::DemoHost;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints every callback as a one-line, human-readable event and wakes
/// `main` up once the task reaches a terminal status.
struct PrintingCallbacks {
    done: Mutex<Option<tokio::sync::oneshot::Sender<TaskStatus>>>,
}

impl PrintingCallbacks {
    fn new(done: tokio::sync::oneshot::Sender<TaskStatus>) -> Self {
        Self {
            done: Mutex::new(Some(done)),
        }
    }
}

impl TaskCallbacks for PrintingCallbacks {
    fn on_message(&self, task_id: &TaskId, message: &TaskMessage) {
        println!("[{task_id}] {:?}: {}", message.kind, message.content);
    }

    fn on_progress(&self, task_id: &TaskId, stage: ProgressStage) {
        println!("[{task_id}] progress: {}", stage.as_str());
    }

    fn on_permission_request(&self, task_id: &TaskId, request: &PermissionRequest) {
        println!("[{task_id}] permission requested: {request:?}");
    }

    fn on_complete(&self, task_id: &TaskId, status: TaskStatus) {
        println!("[{task_id}] complete: {status:?}");
        if let Some(tx) = self.done.lock().unwrap().take() {
            let _ = tx.send(status);
        }
    }

    fn on_error(&self, task_id: &TaskId, message: &str) {
        println!("[{task_id}] error: {message}");
    }

    fn on_status_change(&self, task_id: &TaskId, status: TaskStatus) {
        println!("[{task_id}] status -> {status:?}");
    }

    fn on_debug(&self, task_id: &TaskId, line: &str) {
        tracing::debug!(%task_id, "{line}");
    }

    fn on_todo_update(&self, task_id: &TaskId, todos: &[TodoItem]) {
        println!("[{task_id}] todos updated ({} item(s))", todos.len());
    }

    fn on_auth_error(&self, task_id: &TaskId, provider_id: &str, message: &str) {
        println!("[{task_id}] auth error from {provider_id}: {message}");
    }

    fn on_attachment(&self, task_id: &TaskId, attachment: &Attachment) {
        println!("[{task_id}] attachment: {attachment:?}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Demonstrate the task supervisor end to end.".to_string());

    let host = DemoHost::install().context("failed to install the bundled demo CLI fixture")?;
    let manager = TaskManager::new(Arc::new(host), TaskManagerConfig::default(), Default::default());

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let callbacks = Arc::new(PrintingCallbacks::new(done_tx));
    let task_id = TaskId::new(uuid::Uuid::new_v4().to_string());
    let config = TaskConfig::new(
        NonEmptyString::new(prompt).context("prompt must not be empty")?,
        std::env::current_dir().context("failed to read the current directory")?,
    );

    manager
        .start_task(task_id.clone(), config, callbacks)
        .context("failed to start the demo task")?;

    let status = tokio::time::timeout(Duration::from_secs(30), done_rx)
        .await
        .context("demo task did not finish within 30s")?
        .context("task manager dropped the completion callback")?;

    manager.dispose();

    if !status.is_terminal() {
        bail!("task reported a non-terminal status at completion: {status:?}");
    }

    match status {
        TaskStatus::Completed => Ok(()),
        other => bail!("demo task did not complete successfully: {other:?}"),
    }
}

//! End-to-end coverage of the demo binary's own dependency, exercised the
//! same way `overseer-core`'s integration tests do: a real shell-script
//! child spawned over a pseudoterminal, no mocked process. Covers the
//! two scenarios named as must-pass in the wider protocol: a same-round
//! completion verified by a respawn, and a quiet round that needs a
//! continuation respawn before the model ever calls `complete_task`.

#![cfg(unix)]

use std::collections::HashMap;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use overseer_core::{
    AdapterConfig, HostCapabilities, NonEmptyString, TaskCallbacks, TaskConfig, TaskId, TaskManager,
    TaskManagerConfig, TaskStatus,
};
use tempfile::NamedTempFile;

const HAPPY_PATH_SCRIPT: &str = r#"#!/bin/sh
printf '{"type":"step_start","sessionID":"s1"}\n'
printf '{"type":"tool_call","tool":"start_task","input":{"original_request":"do the thing","needs_planning":true,"goal":"do it","steps":["a","b"],"skills":[]},"sessionID":"s1"}\n'
printf '{"type":"text","text":"working on it","sessionID":"s1"}\n'
printf '{"type":"tool_call","tool":"complete_task","input":{"status":"success","summary":"done","original_request_summary":"do the thing"},"sessionID":"s1"}\n'
printf '{"type":"step_finish","reason":"stop"}\n'
"#;

/// Counts its own invocations through a sidecar file named after its own
/// path (`$0.count`), so the same fixture file can play three different
/// rounds of the completion protocol: a quiet round with no terminal tool
/// call (continuation), a `complete_task` success (verification), and a
/// second `complete_task` success that the protocol accepts as done.
const CONTINUATION_THEN_VERIFIED_SCRIPT: &str = r#"#!/bin/sh
state="$0.count"
n=0
if [ -f "$state" ]; then n=$(cat "$state"); fi
n=$((n + 1))
echo "$n" > "$state"

if [ "$n" -eq 1 ]; then
    printf '{"type":"step_start","sessionID":"s1"}\n'
    printf '{"type":"text","text":"thinking it over","sessionID":"s1"}\n'
    printf '{"type":"step_finish","reason":"end_turn"}\n'
elif [ "$n" -eq 2 ]; then
    printf '{"type":"step_start","sessionID":"s1"}\n'
    printf '{"type":"tool_call","tool":"complete_task","input":{"status":"success","summary":"built it","original_request_summary":"build the thing"},"sessionID":"s1"}\n'
    printf '{"type":"step_finish","reason":"stop"}\n'
else
    printf '{"type":"step_start","sessionID":"s1"}\n'
    printf '{"type":"tool_call","tool":"complete_task","input":{"status":"success","summary":"double-checked, it holds","original_request_summary":"build the thing"},"sessionID":"s1"}\n'
    printf '{"type":"step_finish","reason":"stop"}\n'
fi
"#;

fn write_script(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".sh").tempfile().expect("create fixture script");
    file.write_all(contents.as_bytes()).expect("write fixture script");
    file.flush().expect("flush fixture script");
    let mut perms = file.as_file().metadata().unwrap().permissions();
    perms.set_mode(0o755);
    file.as_file().set_permissions(perms).unwrap();
    file
}

struct ScriptHost {
    script: PathBuf,
}

impl HostCapabilities for ScriptHost {
    fn cli_command(&self) -> (PathBuf, Vec<String>) {
        (self.script.clone(), Vec::new())
    }

    fn build_cli_args(&self, _config: &TaskConfig) -> Vec<String> {
        Vec::new()
    }

    fn build_environment(&self, _task_id: &TaskId) -> HashMap<String, String> {
        HashMap::new()
    }

    fn is_cli_available(&self) -> bool {
        self.script.exists()
    }
}

#[derive(Default)]
struct RecordingCallbacks {
    statuses: Mutex<Vec<TaskStatus>>,
    messages: Mutex<Vec<String>>,
    complete_tx: Mutex<Option<tokio::sync::oneshot::Sender<TaskStatus>>>,
}

impl RecordingCallbacks {
    fn new(complete_tx: tokio::sync::oneshot::Sender<TaskStatus>) -> Self {
        Self {
            complete_tx: Mutex::new(Some(complete_tx)),
            ..Default::default()
        }
    }
}

impl TaskCallbacks for RecordingCallbacks {
    fn on_message(&self, _task_id: &TaskId, message: &overseer_core::TaskMessage) {
        self.messages.lock().unwrap().push(message.content.clone());
    }
    fn on_progress(&self, _task_id: &TaskId, _stage: overseer_core::ProgressStage) {}
    fn on_permission_request(&self, _task_id: &TaskId, _request: &overseer_core::PermissionRequest) {}
    fn on_complete(&self, _task_id: &TaskId, status: TaskStatus) {
        if let Some(tx) = self.complete_tx.lock().unwrap().take() {
            let _ = tx.send(status);
        }
    }
    fn on_error(&self, _task_id: &TaskId, _message: &str) {}
    fn on_status_change(&self, _task_id: &TaskId, status: TaskStatus) {
        self.statuses.lock().unwrap().push(status);
    }
    fn on_debug(&self, _task_id: &TaskId, _line: &str) {}
    fn on_todo_update(&self, _task_id: &TaskId, _todos: &[overseer_core::TodoItem]) {}
    fn on_auth_error(&self, _task_id: &TaskId, _provider_id: &str, _message: &str) {}
}

fn task_config(prompt: &str) -> TaskConfig {
    TaskConfig::new(NonEmptyString::new(prompt).unwrap(), std::env::temp_dir())
}

#[tokio::test]
async fn happy_path_completes_via_a_single_verification_respawn() {
    let script = write_script(HAPPY_PATH_SCRIPT);
    let host = std::sync::Arc::new(ScriptHost {
        script: script.path().to_path_buf(),
    });
    let manager = TaskManager::new(host, TaskManagerConfig::default(), AdapterConfig::default());

    let (complete_tx, complete_rx) = tokio::sync::oneshot::channel();
    let callbacks = std::sync::Arc::new(RecordingCallbacks::new(complete_tx));
    let task_id = TaskId::new("happy-path");

    manager
        .start_task(task_id, task_config("do the thing"), callbacks.clone())
        .expect("task should be admitted immediately");

    let status = tokio::time::timeout(Duration::from_secs(15), complete_rx)
        .await
        .expect("task should finish within 15s")
        .expect("on_complete should fire exactly once");

    assert_eq!(status, TaskStatus::Completed);
    assert!(callbacks.messages.lock().unwrap().iter().any(|m| m.contains("working on it")));
}

#[tokio::test]
async fn quiet_round_respawns_a_continuation_before_completing() {
    let script = write_script(CONTINUATION_THEN_VERIFIED_SCRIPT);
    let host = std::sync::Arc::new(ScriptHost {
        script: script.path().to_path_buf(),
    });
    let manager = TaskManager::new(host, TaskManagerConfig::default(), AdapterConfig::default());

    let (complete_tx, complete_rx) = tokio::sync::oneshot::channel();
    let callbacks = std::sync::Arc::new(RecordingCallbacks::new(complete_tx));
    let task_id = TaskId::new("continuation-path");

    manager
        .start_task(task_id, task_config("build the thing"), callbacks.clone())
        .expect("task should be admitted immediately");

    let status = tokio::time::timeout(Duration::from_secs(15), complete_rx)
        .await
        .expect("task should finish within 15s")
        .expect("on_complete should fire exactly once");

    assert_eq!(status, TaskStatus::Completed);
    // Exactly one terminal status, no matter how many rounds it took to
    // get there.
    let statuses = callbacks.statuses.lock().unwrap();
    assert_eq!(statuses.iter().filter(|s| s.is_terminal()).count(), 1);
    assert!(callbacks.messages.lock().unwrap().iter().any(|m| m.contains("thinking it over")));
}

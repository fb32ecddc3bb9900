//! Orchestrates one task's full lifecycle: spawn the CLI, read its NDJSON
//! stream, dispatch parsed messages, and respawn as many times as the
//! completion protocol demands. Everything here runs on a single tokio
//! task — the run loop is the only thing that ever touches the pty
//! writer, the child guard, or the parser, so none of it needs a mutex;
//! external callers only ever reach it through [`AdapterHandle`]'s
//! channel.

use std::sync::Arc;
use std::time::Duration;

use overseer_classify::{extract_screenshots, sanitize_tool_output, strip_internal_xml, truncate_tool_output};
use overseer_enforcer::{CompletionEnforcer, CompletionStateMachine, ExitAction};
use overseer_parser::{ParserEvent, StreamParser};
use overseer_types::{
    HostCapabilities, MessageKind, NonEmptyString, ProgressStage, ProtocolMessage, TaskCallbacks,
    TaskConfig, TaskId, TaskMessage, TaskStatus,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::auth;
use crate::batcher::MessageBatcher;
use crate::config::AdapterConfig;
use crate::dispatch::{self, DispatchState, ToolOutcome};
use crate::error::AdapterError;
use crate::process::{self, SpawnedChild};

enum Control {
    Interrupt,
    Cancel,
    SendResponse(String),
}

/// A handle to a running adapter's task. Cheap to clone (it's just a
/// channel sender); every method is fire-and-forget except for the
/// `Result` telling the caller whether the adapter's task is even still
/// alive to receive it.
#[derive(Clone)]
pub struct AdapterHandle {
    control_tx: mpsc::UnboundedSender<Control>,
}

impl AdapterHandle {
    pub fn interrupt(&self) -> Result<(), AdapterError> {
        self.control_tx
            .send(Control::Interrupt)
            .map_err(|_| AdapterError::TaskNotActive)
    }

    pub fn cancel(&self) -> Result<(), AdapterError> {
        self.control_tx
            .send(Control::Cancel)
            .map_err(|_| AdapterError::TaskNotActive)
    }

    pub fn send_response(&self, text: String) -> Result<(), AdapterError> {
        self.control_tx
            .send(Control::SendResponse(text))
            .map_err(|_| AdapterError::TaskNotActive)
    }
}

/// Spawn the adapter's run loop onto its own tokio task. Returns
/// immediately; the first child spawn (and everything after) happens
/// inside the spawned task, not before this function returns.
#[must_use]
pub fn spawn_adapter(
    task_id: TaskId,
    host: Arc<dyn HostCapabilities>,
    callbacks: Arc<dyn TaskCallbacks>,
    task_config: TaskConfig,
    config: AdapterConfig,
) -> (AdapterHandle, tokio::task::JoinHandle<TaskStatus>) {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let max_attempts = config.max_continuation_attempts;
    let max_buffer_bytes = config.max_buffer_bytes;
    let batcher = MessageBatcher::new(callbacks.clone(), task_id.clone(), config.batch_window);
    let run = AdapterRun {
        task_id,
        host,
        callbacks,
        config,
        task_config,
        parser: StreamParser::with_max_buffer_bytes(max_buffer_bytes),
        enforcer: CompletionEnforcer::new(CompletionStateMachine::new(max_attempts)),
        dispatch_state: DispatchState::new(),
        batcher,
        session_id: None,
        terminal_emitted: false,
        was_interrupted: false,
        in_continuation_cycle: false,
        control_rx,
    };
    let join = tokio::spawn(run.run());
    (AdapterHandle { control_tx }, join)
}

enum RoundOutcome {
    Error(AdapterError),
    Cancelled,
    ExitAction(ExitAction),
}

struct AdapterRun {
    task_id: TaskId,
    host: Arc<dyn HostCapabilities>,
    callbacks: Arc<dyn TaskCallbacks>,
    config: AdapterConfig,
    task_config: TaskConfig,
    parser: StreamParser,
    enforcer: CompletionEnforcer,
    dispatch_state: DispatchState,
    batcher: MessageBatcher,
    session_id: Option<String>,
    terminal_emitted: bool,
    was_interrupted: bool,
    in_continuation_cycle: bool,
    control_rx: mpsc::UnboundedReceiver<Control>,
}

impl AdapterRun {
    async fn run(mut self) -> TaskStatus {
        self.callbacks.on_status_change(&self.task_id, TaskStatus::Running);
        self.callbacks.on_progress(&self.task_id, ProgressStage::Starting);
        self.callbacks.on_progress(&self.task_id, ProgressStage::Environment);

        let mut prompt = self.task_config.prompt.as_str().to_string();

        loop {
            match NonEmptyString::new(prompt.clone()) {
                Ok(p) => self.task_config.prompt = p,
                Err(_) => return self.finish_error(AdapterError::Spawn("empty respawn prompt".to_string())),
            }

            let spawned = match self.spawn_round().await {
                Ok(spawned) => spawned,
                Err(err) => return self.finish_error(err),
            };
            self.callbacks.on_progress(&self.task_id, ProgressStage::Loading);

            match self.drive_round(spawned).await {
                RoundOutcome::Error(err) => return self.finish_error(err),
                RoundOutcome::Cancelled => return self.finish(TaskStatus::Cancelled),
                RoundOutcome::ExitAction(ExitAction::Complete) => {
                    // An interrupted child that then exits cleanly (code 0)
                    // still counts as interrupted, not a real completion.
                    // The enforcer can't tell the two apart on its own:
                    // both look like "process exited, no pending
                    // continuation".
                    if self.was_interrupted {
                        return self.finish(TaskStatus::Interrupted);
                    }
                    return self.finish(TaskStatus::Completed);
                }
                RoundOutcome::ExitAction(ExitAction::Error { exit_code }) => {
                    return self.finish_error(AdapterError::ChildExit { code: exit_code });
                }
                RoundOutcome::ExitAction(
                    ExitAction::SpawnVerification { prompt: next }
                    | ExitAction::SpawnContinuation { prompt: next }
                    | ExitAction::SpawnPartialContinuation { prompt: next },
                ) => {
                    prompt = next;
                    self.task_config.resume_session_id = self.session_id.clone();
                    self.parser.reset();
                    self.dispatch_state.rearm_for_resumption();
                    self.in_continuation_cycle = true;
                }
            }
        }
    }

    async fn spawn_round(&mut self) -> Result<SpawnedChild, AdapterError> {
        self.host.on_before_start();
        let (cli_path, prefix_args) = self.host.cli_command();
        let mut args = prefix_args;
        args.extend(self.host.build_cli_args(&self.task_config));
        let env = self.host.build_environment(&self.task_id);
        process::spawn_pty_child(
            &cli_path,
            &args,
            &self.task_config.working_directory,
            &env,
            self.config.pty_cols,
            self.config.pty_rows,
        )
    }

    #[allow(clippy::too_many_lines)]
    async fn drive_round(&mut self, spawned: SpawnedChild) -> RoundOutcome {
        let SpawnedChild {
            mut writer,
            mut reader_rx,
            mut guard,
        } = spawned;

        let mut waiting_deadline = Some(Instant::now() + self.config.waiting_timer_threshold);
        #[cfg_attr(not(windows), allow(unused_mut))]
        let mut interrupt_confirm_deadline: Option<Instant> = None;

        loop {
            let batch_deadline = self.batcher.deadline();

            tokio::select! {
                biased;

                maybe_chunk = reader_rx.recv() => {
                    match maybe_chunk {
                        Some(bytes) => {
                            let stripped = overseer_util::strip_ansi(&String::from_utf8_lossy(&bytes));
                            let events = self.parser.feed(stripped.as_bytes());
                            for event in events {
                                if let Some(outcome) = self.handle_parser_event(event, &mut waiting_deadline) {
                                    guard.kill();
                                    self.batcher.flush();
                                    return outcome;
                                }
                            }
                        }
                        None => {
                            for event in self.parser.flush() {
                                if let Some(outcome) = self.handle_parser_event(event, &mut waiting_deadline) {
                                    guard.kill();
                                    self.batcher.flush();
                                    return outcome;
                                }
                            }
                            self.batcher.flush();
                            let child = guard.take();
                            let exit_code = wait_for_exit(child).await;
                            return RoundOutcome::ExitAction(self.enforcer.on_process_exit(exit_code));
                        }
                    }
                }

                Some(control) = self.control_rx.recv() => {
                    match control {
                        Control::Cancel => {
                            guard.kill();
                            self.batcher.flush();
                            return RoundOutcome::Cancelled;
                        }
                        Control::Interrupt => {
                            use std::io::Write as _;
                            let _ = writer.write_all(&[0x03]);
                            let _ = writer.flush();
                            self.was_interrupted = true;
                            #[cfg(windows)]
                            {
                                interrupt_confirm_deadline = Some(Instant::now() + Duration::from_millis(100));
                            }
                        }
                        Control::SendResponse(text) => {
                            use std::io::Write as _;
                            let _ = writer.write_all(text.as_bytes());
                            let _ = writer.write_all(b"\n");
                            let _ = writer.flush();
                        }
                    }
                }

                () = sleep_until_or_pending(waiting_deadline), if waiting_deadline.is_some() => {
                    self.callbacks.on_progress(&self.task_id, ProgressStage::Waiting);
                    waiting_deadline = None;
                }

                () = sleep_until_or_pending(batch_deadline), if batch_deadline.is_some() => {
                    self.batcher.flush();
                }

                () = sleep_until_or_pending(interrupt_confirm_deadline), if interrupt_confirm_deadline.is_some() => {
                    use std::io::Write as _;
                    let _ = writer.write_all(b"Y\n");
                    let _ = writer.flush();
                    interrupt_confirm_deadline = None;
                }
            }
        }
    }

    fn handle_parser_event(
        &mut self,
        event: ParserEvent,
        waiting_deadline: &mut Option<Instant>,
    ) -> Option<RoundOutcome> {
        match event {
            ParserEvent::Error(err) => {
                self.callbacks.on_debug(&self.task_id, &format!("stream parser: {err}"));
                None
            }
            ParserEvent::Message(message) => self.handle_protocol_message(message, waiting_deadline),
        }
    }

    fn handle_protocol_message(
        &mut self,
        message: ProtocolMessage,
        waiting_deadline: &mut Option<Instant>,
    ) -> Option<RoundOutcome> {
        match message {
            ProtocolMessage::StepStart { session_id } => {
                if self.session_id.is_none() {
                    self.callbacks.on_session_id(&self.task_id, &session_id);
                }
                self.session_id = Some(session_id);
                *waiting_deadline = Some(Instant::now() + self.config.waiting_timer_threshold);
                self.callbacks.on_progress(&self.task_id, ProgressStage::Connecting);
                None
            }
            ProtocolMessage::Text { text, .. } => {
                if !self.in_continuation_cycle {
                    let cleaned = strip_internal_xml(&text);
                    self.batcher
                        .push(TaskMessage::new(new_message_id(), MessageKind::Assistant, cleaned));
                }
                None
            }
            ProtocolMessage::ToolCall { tool, input, .. } => {
                *waiting_deadline = None;
                self.callbacks.on_progress(&self.task_id, ProgressStage::ToolUse);
                self.apply_tool_outcome(&tool, dispatch::on_tool_call(&mut self.dispatch_state, &tool, &input));
                None
            }
            ProtocolMessage::ToolUse { tool, state, .. } => {
                *waiting_deadline = None;
                self.callbacks.on_progress(&self.task_id, ProgressStage::ToolUse);
                self.apply_tool_outcome(&tool, dispatch::on_tool_use(&mut self.dispatch_state, &tool, &state));
                None
            }
            ProtocolMessage::ToolResult { output } => {
                let sanitized = truncate_tool_output(&sanitize_tool_output(&output));
                let (text, attachments) = extract_screenshots(&sanitized);
                self.batcher.push(
                    TaskMessage::new(new_message_id(), MessageKind::Tool, text).with_attachments(attachments),
                );
                None
            }
            ProtocolMessage::StepFinish { reason, .. } => {
                let _ = self.enforcer.on_step_finish(&reason);
                None
            }
            ProtocolMessage::Error { error } => {
                if auth::is_auth_error(&error) {
                    let provider_id = auth::guess_provider_id(&error);
                    Some(RoundOutcome::Error(AdapterError::AuthFailure {
                        provider_id,
                        message: error,
                    }))
                } else {
                    Some(RoundOutcome::Error(AdapterError::ChildProtocolError(error)))
                }
            }
            ProtocolMessage::Unknown { raw } => {
                self.callbacks.on_debug(&self.task_id, &format!("unrecognized message: {raw}"));
                None
            }
        }
    }

    fn apply_tool_outcome(&mut self, tool: &str, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::Hidden => {}
            ToolOutcome::StartTask { plan_message, todos } => {
                if let Some(message) = plan_message {
                    self.batcher.push(message);
                }
                if !todos.is_empty() {
                    self.callbacks.on_todo_update(&self.task_id, &todos);
                }
            }
            ToolOutcome::TodoWrite { todos } => {
                self.callbacks.on_todo_update(&self.task_id, &todos);
            }
            ToolOutcome::CompleteTask(args) => {
                self.enforcer.on_complete_task(args);
            }
            ToolOutcome::Tool { message, out_of_order } => {
                if out_of_order {
                    self.callbacks
                        .on_debug(&self.task_id, &format!("tool '{tool}' called before start_task"));
                }
                self.batcher.push(message);
            }
            ToolOutcome::Malformed { tool, error } => {
                self.callbacks
                    .on_debug(&self.task_id, &format!("malformed '{tool}' call: {error}"));
            }
        }
    }

    fn finish_error(&mut self, err: AdapterError) -> TaskStatus {
        if self.was_interrupted && matches!(err, AdapterError::ChildExit { .. }) {
            return self.finish(TaskStatus::Interrupted);
        }
        if let AdapterError::AuthFailure { provider_id, message } = &err {
            self.callbacks.on_auth_error(&self.task_id, provider_id, message);
            return self.finish(TaskStatus::Failed);
        }
        self.callbacks.on_error(&self.task_id, &err.to_string());
        self.finish(TaskStatus::Failed)
    }

    fn finish(&mut self, status: TaskStatus) -> TaskStatus {
        if !self.terminal_emitted {
            self.terminal_emitted = true;
            self.batcher.flush();
            self.callbacks.on_status_change(&self.task_id, status);
            self.callbacks.on_complete(&self.task_id, status);
        }
        status
    }
}

async fn sleep_until_or_pending(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn wait_for_exit(child: Option<Box<dyn portable_pty::Child + Send + Sync>>) -> i32 {
    let Some(mut child) = child else { return 0 };
    match tokio::task::spawn_blocking(move || child.wait()).await {
        Ok(Ok(status)) => i32::try_from(status.exit_code()).unwrap_or(-1),
        _ => -1,
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

//! Pure (no IO, no async) tool-call classification and message-shaping
//! logic the run loop delegates to. Kept separate from `adapter.rs` so it
//! can be unit tested without spinning up a pseudoterminal.

use overseer_classify::{classify_tool, display_name, extract_screenshots, sanitize_tool_output, truncate_tool_output, ToolRole};
use overseer_types::{
    Attachment, CompleteTaskArgs, MessageKind, StartTaskArgs, TaskMessage, TodoId, TodoItem,
    TodoPriority, TodoStatus, TodoWriteArgs, ToolUseState, ToolUseStatus,
};
use serde_json::Value;

/// Tracks the two pieces of per-task state dispatch needs beyond what the
/// completion enforcer already owns: whether `start_task` has fired yet,
/// and the most recently mirrored todo list.
#[derive(Debug, Clone, Default)]
pub struct DispatchState {
    pub planning_seen: bool,
    pub todos: Vec<TodoItem>,
}

impl DispatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset on session resumption: a respawned process re-announces its
    /// plan if it has one, so the "have we seen start_task" gate should
    /// re-arm. The todo mirror is left alone — the host already has it
    /// and clearing it would just produce a confusing blank-then-refill
    /// flicker for no benefit.
    pub fn rearm_for_resumption(&mut self) {
        self.planning_seen = false;
    }
}

/// What the run loop should do in response to one `tool_call`/`tool_use`
/// event, once dispatch has classified it.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Classified as hidden; nothing is shown or recorded.
    Hidden,
    /// `start_task` was called. `plan_message` is `Some` only when the
    /// call carried a non-empty step list worth announcing.
    StartTask {
        plan_message: Option<TaskMessage>,
        todos: Vec<TodoItem>,
    },
    /// `todowrite` normalized into the host's todo shape.
    TodoWrite { todos: Vec<TodoItem> },
    /// `complete_task`'s arguments, handed to the completion enforcer.
    CompleteTask(CompleteTaskArgs),
    /// An ordinary tool call or use, already formatted as a message.
    Tool {
        message: TaskMessage,
        /// The call arrived before `start_task`; the run loop should
        /// still dispatch it but also emit a debug warning.
        out_of_order: bool,
    },
    /// The tool name matched a special role but its arguments didn't
    /// decode; the run loop should log this and otherwise ignore the call.
    Malformed { tool: String, error: String },
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn synthesize_todos_from_steps(steps: &[String]) -> Vec<TodoItem> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let mut item = TodoItem::new(TodoId::synthesize(index), step.clone());
            item.status = if index == 0 {
                TodoStatus::InProgress
            } else {
                TodoStatus::Pending
            };
            item
        })
        .collect()
}

fn plan_message_from_start_task(args: &StartTaskArgs) -> Option<TaskMessage> {
    let steps = args.steps.as_ref().filter(|steps| !steps.is_empty())?;
    if !args.needs_planning {
        return None;
    }
    let mut content = String::new();
    if let Some(goal) = &args.goal {
        content.push_str(goal);
        content.push('\n');
    }
    for step in steps {
        content.push_str("- ");
        content.push_str(step);
        content.push('\n');
    }
    Some(TaskMessage::new(
        new_message_id(),
        MessageKind::System,
        content.trim_end().to_string(),
    ))
}

fn normalize_todowrite(args: TodoWriteArgs) -> Vec<TodoItem> {
    args.todos
        .into_iter()
        .enumerate()
        .map(|(index, entry)| TodoItem {
            id: entry
                .id
                .map(TodoId::new)
                .unwrap_or_else(|| TodoId::synthesize(index)),
            content: entry.content,
            status: entry.status.unwrap_or(TodoStatus::Pending),
            priority: entry.priority.unwrap_or(TodoPriority::Medium),
        })
        .collect()
}

/// Handle a `tool_call` event (announcement only, no output yet).
pub fn on_tool_call(state: &mut DispatchState, tool: &str, input: &Value) -> ToolOutcome {
    match classify_tool(tool) {
        ToolRole::Hidden => ToolOutcome::Hidden,
        ToolRole::StartTask => match StartTaskArgs::from_input(input) {
            Ok(args) => {
                state.planning_seen = true;
                let todos = args
                    .steps
                    .as_ref()
                    .filter(|_| args.needs_planning)
                    .map(|steps| synthesize_todos_from_steps(steps))
                    .unwrap_or_default();
                if !todos.is_empty() {
                    state.todos = todos.clone();
                }
                ToolOutcome::StartTask {
                    plan_message: plan_message_from_start_task(&args),
                    todos,
                }
            }
            Err(err) => ToolOutcome::Malformed {
                tool: tool.to_string(),
                error: err.to_string(),
            },
        },
        ToolRole::CompleteTask => match CompleteTaskArgs::from_input(input) {
            Ok(args) => ToolOutcome::CompleteTask(args),
            Err(err) => ToolOutcome::Malformed {
                tool: tool.to_string(),
                error: err.to_string(),
            },
        },
        ToolRole::NonContinuation if is_todowrite(tool) => match TodoWriteArgs::from_input(input) {
            Ok(args) => {
                let todos = normalize_todowrite(args);
                state.todos = todos.clone();
                ToolOutcome::TodoWrite { todos }
            }
            Err(err) => ToolOutcome::Malformed {
                tool: tool.to_string(),
                error: err.to_string(),
            },
        },
        ToolRole::NonContinuation => announce_tool(state, tool, input),
        ToolRole::Continuation => announce_tool(state, tool, input),
    }
}

fn is_todowrite(tool: &str) -> bool {
    tool == "todowrite" || tool.ends_with("_todowrite")
}

fn announce_tool(state: &DispatchState, tool: &str, input: &Value) -> ToolOutcome {
    let Some(label) = display_name(tool) else {
        return ToolOutcome::Hidden;
    };
    let message = TaskMessage::new(new_message_id(), MessageKind::Tool, label)
        .with_tool(tool, Some(input.clone()));
    ToolOutcome::Tool {
        message,
        out_of_order: !state.planning_seen && classify_tool(tool) == ToolRole::Continuation,
    }
}

/// Handle a `tool_use` event (full lifecycle state: input, optional
/// output, status). Special tools are classified the same way as
/// `tool_call`; ordinary tools get their output sanitized and any
/// embedded screenshots pulled out as attachments once the status is no
/// longer `pending`.
pub fn on_tool_use(state: &mut DispatchState, tool: &str, use_state: &ToolUseState) -> ToolOutcome {
    match classify_tool(tool) {
        ToolRole::Hidden => ToolOutcome::Hidden,
        ToolRole::StartTask | ToolRole::CompleteTask => on_tool_call(state, tool, &use_state.input),
        ToolRole::NonContinuation if is_todowrite(tool) => on_tool_call(state, tool, &use_state.input),
        _ => on_ordinary_tool_use(state, tool, use_state),
    }
}

fn on_ordinary_tool_use(state: &DispatchState, tool: &str, use_state: &ToolUseState) -> ToolOutcome {
    let Some(label) = display_name(tool) else {
        return ToolOutcome::Hidden;
    };
    let out_of_order = !state.planning_seen && classify_tool(tool) == ToolRole::Continuation;

    if use_state.status == ToolUseStatus::Pending {
        let message = TaskMessage::new(new_message_id(), MessageKind::Tool, label)
            .with_tool(tool, Some(use_state.input.clone()));
        return ToolOutcome::Tool {
            message,
            out_of_order,
        };
    }

    let raw_output = use_state
        .output
        .as_ref()
        .map(value_to_display_text)
        .unwrap_or_default();
    let sanitized = truncate_tool_output(&sanitize_tool_output(&raw_output));
    let (text, attachments): (String, Vec<Attachment>) = extract_screenshots(&sanitized);

    let message = TaskMessage::new(new_message_id(), MessageKind::Tool, text)
        .with_tool(tool, Some(use_state.input.clone()))
        .with_attachments(attachments);
    ToolOutcome::Tool {
        message,
        out_of_order,
    }
}

fn value_to_display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hidden_tool_call_is_hidden() {
        let mut state = DispatchState::new();
        let outcome = on_tool_call(&mut state, "discard", &json!({}));
        assert!(matches!(outcome, ToolOutcome::Hidden));
    }

    #[test]
    fn start_task_arms_planning_and_synthesizes_todos() {
        let mut state = DispatchState::new();
        let input = json!({
            "original_request": "ship the feature",
            "needs_planning": true,
            "goal": "ship it",
            "steps": ["write code", "write tests"],
            "skills": [],
        });
        let outcome = on_tool_call(&mut state, "start_task", &input);
        assert!(state.planning_seen);
        match outcome {
            ToolOutcome::StartTask { plan_message, todos } => {
                assert!(plan_message.is_some());
                assert_eq!(todos.len(), 2);
                assert_eq!(todos[0].status, TodoStatus::InProgress);
                assert_eq!(todos[1].status, TodoStatus::Pending);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn start_task_without_planning_has_no_plan_message() {
        let mut state = DispatchState::new();
        let input = json!({"original_request": "quick fix", "needs_planning": false, "skills": []});
        let outcome = on_tool_call(&mut state, "start_task", &input);
        match outcome {
            ToolOutcome::StartTask { plan_message, todos } => {
                assert!(plan_message.is_none());
                assert!(todos.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn todowrite_synthesizes_missing_ids_and_defaults() {
        let mut state = DispatchState::new();
        let input = json!({"todos": [{"content": "write tests"}]});
        let outcome = on_tool_call(&mut state, "todowrite", &input);
        match outcome {
            ToolOutcome::TodoWrite { todos } => {
                assert_eq!(todos.len(), 1);
                assert_eq!(todos[0].id.as_str(), "todo-0");
                assert_eq!(todos[0].status, TodoStatus::Pending);
                assert_eq!(todos[0].priority, TodoPriority::Medium);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(state.todos.len(), 1);
    }

    #[test]
    fn complete_task_call_is_extracted_for_the_enforcer() {
        let mut state = DispatchState::new();
        let input = json!({
            "status": "success",
            "summary": "done",
            "original_request_summary": "do it",
        });
        let outcome = on_tool_call(&mut state, "complete_task", &input);
        assert!(matches!(outcome, ToolOutcome::CompleteTask(_)));
    }

    #[test]
    fn malformed_special_tool_call_is_reported_not_panicked() {
        let mut state = DispatchState::new();
        let outcome = on_tool_call(&mut state, "complete_task", &json!({"status": "success"}));
        assert!(matches!(outcome, ToolOutcome::Malformed { .. }));
    }

    #[test]
    fn ordinary_tool_before_start_task_is_flagged_out_of_order() {
        let mut state = DispatchState::new();
        let outcome = on_tool_call(&mut state, "bash", &json!({"cmd": "ls"}));
        match outcome {
            ToolOutcome::Tool { out_of_order, .. } => assert!(out_of_order),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn ordinary_tool_after_start_task_is_not_flagged() {
        let mut state = DispatchState::new();
        state.planning_seen = true;
        let outcome = on_tool_call(&mut state, "bash", &json!({"cmd": "ls"}));
        match outcome {
            ToolOutcome::Tool { out_of_order, .. } => assert!(!out_of_order),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn pending_tool_use_announces_without_output() {
        let state = DispatchState::new();
        let use_state = ToolUseState {
            input: json!({"cmd": "ls"}),
            output: None,
            status: ToolUseStatus::Pending,
        };
        let outcome = on_ordinary_tool_use(&state, "bash", &use_state);
        match outcome {
            ToolOutcome::Tool { message, .. } => assert_eq!(message.content, "Running command"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn completed_tool_use_sanitizes_and_extracts_screenshots() {
        let state = DispatchState::new();
        let use_state = ToolUseState {
            input: json!({"url": "http://x"}),
            output: Some(Value::String(
                "shot: data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==".to_string(),
            )),
            status: ToolUseStatus::Completed,
        };
        let outcome = on_ordinary_tool_use(&state, "browser_navigate", &use_state);
        match outcome {
            ToolOutcome::Tool { message, .. } => {
                assert!(message.content.contains("[Screenshot captured]"));
                assert_eq!(message.attachments.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn hidden_tool_use_is_hidden() {
        let mut state = DispatchState::new();
        let use_state = ToolUseState {
            input: json!({}),
            output: Some(Value::String("x".to_string())),
            status: ToolUseStatus::Completed,
        };
        let outcome = on_tool_use(&mut state, "discard", &use_state);
        assert!(matches!(outcome, ToolOutcome::Hidden));
    }
}

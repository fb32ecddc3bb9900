//! Coalesces outbound messages so a bursty child (a tool emitting many
//! small stdout chunks) doesn't turn into a host callback per chunk. The
//! host callback surface is a single `on_message` hook (see
//! `overseer_types::TaskCallbacks`), so "batching" here means delaying
//! delivery by up to the configured window and then flushing every
//! queued message through that hook in order, rather than a separate
//! batch-shaped callback.

use std::sync::Arc;
use std::time::Duration;

use overseer_types::{TaskCallbacks, TaskId, TaskMessage};
use tokio::time::Instant;

pub struct MessageBatcher {
    callbacks: Arc<dyn TaskCallbacks>,
    task_id: TaskId,
    window: Duration,
    pending: Vec<TaskMessage>,
    deadline: Option<Instant>,
}

impl MessageBatcher {
    #[must_use]
    pub fn new(callbacks: Arc<dyn TaskCallbacks>, task_id: TaskId, window: Duration) -> Self {
        Self {
            callbacks,
            task_id,
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    /// Queue a message. Arms the coalescing deadline on the first message
    /// since the last flush.
    pub fn push(&mut self, message: TaskMessage) {
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.window);
        }
        self.pending.push(message);
    }

    /// The instant the batcher should next be flushed, if anything is
    /// queued. Used as a `tokio::select!` branch deadline by the run loop.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deliver every queued message to the host, in arrival order, and
    /// clear the deadline.
    pub fn flush(&mut self) {
        for message in self.pending.drain(..) {
            self.callbacks.on_message(&self.task_id, &message);
        }
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overseer_types::MessageKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        messages: Mutex<Vec<String>>,
    }

    impl TaskCallbacks for Recording {
        fn on_message(&self, _task_id: &TaskId, message: &TaskMessage) {
            self.messages.lock().unwrap().push(message.content.clone());
        }
        fn on_progress(&self, _task_id: &TaskId, _stage: overseer_types::ProgressStage) {}
        fn on_permission_request(&self, _task_id: &TaskId, _request: &overseer_types::PermissionRequest) {}
        fn on_complete(&self, _task_id: &TaskId, _status: overseer_types::TaskStatus) {}
        fn on_error(&self, _task_id: &TaskId, _message: &str) {}
        fn on_status_change(&self, _task_id: &TaskId, _status: overseer_types::TaskStatus) {}
        fn on_debug(&self, _task_id: &TaskId, _line: &str) {}
        fn on_todo_update(&self, _task_id: &TaskId, _todos: &[overseer_types::TodoItem]) {}
        fn on_auth_error(&self, _task_id: &TaskId, _provider_id: &str, _message: &str) {}
    }

    #[test]
    fn queues_until_flushed_then_delivers_in_order() {
        let recording = Arc::new(Recording::default());
        let mut batcher = MessageBatcher::new(
            recording.clone(),
            TaskId::new("t1"),
            Duration::from_millis(50),
        );
        assert!(batcher.deadline().is_none());

        batcher.push(TaskMessage::new("m1", MessageKind::Assistant, "one"));
        assert!(batcher.deadline().is_some());
        batcher.push(TaskMessage::new("m2", MessageKind::Assistant, "two"));
        assert!(recording.messages.lock().unwrap().is_empty());

        batcher.flush();
        assert_eq!(
            *recording.messages.lock().unwrap(),
            vec!["one".to_string(), "two".to_string()]
        );
        assert!(batcher.deadline().is_none());
        assert!(batcher.is_empty());
    }
}

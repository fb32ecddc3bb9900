use std::time::Duration;

/// How long a step can run without a tool call before the adapter reports
/// a `waiting` progress hint to the host. Named rather than inlined since
/// it is referenced from both the run loop and its tests.
pub const WAITING_TIMER_THRESHOLD: Duration = Duration::from_millis(500);

/// Tuning knobs for [`crate::spawn_adapter`]. Everything here has a
/// sensible default; a host only needs to override a field if its CLI
/// genuinely needs a different pseudoterminal size or retry budget.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Pseudoterminal column count. Wide and short by default: the child
    /// is a non-interactive CLI, not a terminal UI, so we want to avoid
    /// the line-wrapping a narrow terminal would otherwise inflict on its
    /// NDJSON output.
    pub pty_cols: u16,
    pub pty_rows: u16,
    /// How long a step may run without a tool call before a `waiting`
    /// progress hint fires.
    pub waiting_timer_threshold: Duration,
    /// Outbound message coalescing window (see [`crate::batcher`]).
    pub batch_window: Duration,
    /// Upper bound on stream parser buffer growth before a recoverable
    /// overflow is reported (see `overseer_parser::MAX_BUFFER_BYTES`).
    pub max_buffer_bytes: usize,
    /// Passed straight through to the completion state machine.
    pub max_continuation_attempts: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            pty_cols: 32000,
            pty_rows: 30,
            waiting_timer_threshold: WAITING_TIMER_THRESHOLD,
            batch_window: Duration::from_millis(50),
            max_buffer_bytes: overseer_parser::MAX_BUFFER_BYTES,
            max_continuation_attempts: 20,
        }
    }
}

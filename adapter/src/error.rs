use thiserror::Error;

/// Failures the adapter can surface to its caller. Spawn-time failures are
/// returned synchronously from [`crate::spawn_adapter`]'s first spawn
/// attempt; everything else arrives through `on_error`/`on_complete`
/// (`TaskStatus::Failed`) on the task's own callbacks.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to spawn child process: {0}")]
    Spawn(String),

    /// The host's `cli_command` does not resolve to a `.exe` on Windows.
    /// Rejected at construction time: we never wrap a CLI invocation in a
    /// `cmd.exe` shell, so a non-executable command can never actually run.
    #[error("on Windows the CLI command must resolve to an .exe; cmd.exe wrapping is not supported")]
    WindowsCmdWrapperForbidden,

    #[error("child process exited with code {code}")]
    ChildExit { code: i32 },

    #[error("authentication failure from provider {provider_id}: {message}")]
    AuthFailure { provider_id: String, message: String },

    #[error("child reported a protocol-level error: {0}")]
    ChildProtocolError(String),

    #[error("failed to write to child process stdin: {0}")]
    Write(String),

    /// A control command (interrupt/cancel/send_response) arrived after
    /// the adapter's task had already finished running.
    #[error("adapter task is no longer running")]
    TaskNotActive,
}

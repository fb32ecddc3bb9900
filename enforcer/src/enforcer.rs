use overseer_types::{CompleteTaskArgs, StepFinishReason};
use tracing::debug;

use crate::prompts::{self, CONTINUATION_PROMPT};
use crate::state_machine::{CompleteOutcome, CompletionState, CompletionStateMachine};

/// What the adapter should do once the child process for the current round
/// has finished emitting its stream. Computed from a [`StepFinishReason`]
/// alone; it never decides whether to respawn a process (that's
/// [`ExitAction`], decided once the process has actually exited).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The reason wasn't `Stop` or `EndTurn`; the step hasn't finished the
    /// round as far as the completion protocol is concerned.
    Continue,
    /// The round ended and the protocol has more work scheduled for it —
    /// the adapter should let the current process exit naturally and wait
    /// for [`CompletionEnforcer::on_process_exit`] to say what's next.
    Pending,
    /// The task is finished: `complete_task` was accepted, retries were
    /// exhausted, or the model claimed a terminal non-retrying outcome
    /// (`blocked`, or any unrecognized status).
    Complete,
}

/// What the adapter should do once the child process has actually exited.
/// A simpler, enum-returning alternative to a callback-trait-object design:
/// the adapter already owns the process lifecycle, so handing it a plain
/// value to match on is less machinery than threading a `dyn` callback
/// through the enforcer (see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq)]
pub enum ExitAction {
    /// The process exited with a non-zero code before the protocol reached
    /// a terminal state; the adapter should surface this as a task error
    /// rather than silently respawning.
    Error { exit_code: i32 },
    /// Respawn the CLI in the same session with this prompt, to double
    /// check a claimed `success` actually holds up.
    SpawnVerification { prompt: String },
    /// Respawn the CLI in the same session with this prompt because the
    /// turn ended without a terminal `complete_task` call.
    SpawnContinuation { prompt: String },
    /// Respawn the CLI in the same session with this prompt after a
    /// `partial` claim, forcing a fresh TODO list for the remaining work.
    SpawnPartialContinuation { prompt: String },
    /// The task reached a genuinely terminal state: done, blocked, or out
    /// of retries. Nothing more to spawn.
    Complete,
}

/// Drives a single task's [`CompletionStateMachine`] from the protocol
/// events the adapter observes (`complete_task` calls, `step_finish`
/// events, and process exits), and produces the prompts needed to resume
/// a session when the protocol isn't satisfied yet.
#[derive(Debug, Clone)]
pub struct CompletionEnforcer {
    machine: CompletionStateMachine,
    /// The most recent `complete_task` call's arguments, kept so the
    /// verification and partial-continuation prompts can quote the
    /// model's own summary back to it.
    recorded: Option<CompleteTaskArgs>,
}

impl Default for CompletionEnforcer {
    fn default() -> Self {
        Self::new(CompletionStateMachine::default())
    }
}

impl CompletionEnforcer {
    #[must_use]
    pub fn new(machine: CompletionStateMachine) -> Self {
        Self {
            machine,
            recorded: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> CompletionState {
        self.machine.state()
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.machine.attempts()
    }

    /// Record a `complete_task` call. Returns `false` if the call arrived
    /// in a state where it isn't legal (e.g. a second call in the same
    /// round) and was ignored; the adapter should not forward those to
    /// anything downstream.
    pub fn on_complete_task(&mut self, args: CompleteTaskArgs) -> bool {
        let outcome = CompleteOutcome::from(&args.status);
        match self.machine.record_complete_task_call(outcome) {
            Ok(state) => {
                debug!(?state, status = args.status.as_str(), "complete_task recorded");
                self.recorded = Some(args);
                true
            }
            Err(err) => {
                debug!(%err, "ignoring out-of-protocol complete_task call");
                false
            }
        }
    }

    /// Decide what the current round's end means for the protocol. Only
    /// `Stop`/`EndTurn` are terminal reasons; anything else means the round
    /// isn't over yet. `Verifying` is handled as "complete_task wasn't
    /// called this round" rather than falling into the already-terminal
    /// branch: a quiet round during verification means the model didn't
    /// reconfirm its claim, so the protocol needs another round, not
    /// acceptance.
    pub fn on_step_finish(&mut self, reason: &StepFinishReason) -> StepOutcome {
        if !reason.is_terminal() {
            return StepOutcome::Continue;
        }
        debug!(?reason, state = ?self.machine.state(), "step finished");
        match self.machine.state() {
            CompletionState::AwaitingVerification | CompletionState::PartialContinuationPending => {
                StepOutcome::Pending
            }
            CompletionState::Verifying => {
                let _ = self.machine.verification_continuing();
                StepOutcome::Pending
            }
            CompletionState::Idle => match self.machine.schedule_continuation() {
                Ok(true) => StepOutcome::Pending,
                Ok(false) | Err(_) => StepOutcome::Complete,
            },
            CompletionState::CompleteTaskCalled
            | CompletionState::ContinuationPending
            | CompletionState::VerificationContinuing
            | CompletionState::MaxRetriesReached
            | CompletionState::Done => StepOutcome::Complete,
        }
    }

    /// Decide what to do now that the process has actually exited. A
    /// non-zero `exit_code` always wins: a crash mid-protocol is an error
    /// regardless of what the state machine was waiting for.
    pub fn on_process_exit(&mut self, exit_code: i32) -> ExitAction {
        if exit_code != 0 {
            return ExitAction::Error { exit_code };
        }

        match self.machine.state() {
            CompletionState::ContinuationPending => {
                let _ = self.machine.start_continuation();
                ExitAction::SpawnContinuation {
                    prompt: CONTINUATION_PROMPT.to_string(),
                }
            }
            // A quiet round during verification already moved the machine
            // to `VerificationContinuing` in `on_step_finish`; spawning a
            // continuation (not another verification pass) is what
            // schedule_continuation + start_continuation does from here.
            CompletionState::VerificationContinuing => match self.machine.schedule_continuation() {
                Ok(true) => {
                    let _ = self.machine.start_continuation();
                    ExitAction::SpawnContinuation {
                        prompt: CONTINUATION_PROMPT.to_string(),
                    }
                }
                Ok(false) | Err(_) => ExitAction::Complete,
            },
            CompletionState::AwaitingVerification => {
                let _ = self.machine.start_verification();
                let prompt = self.build_verification_prompt();
                ExitAction::SpawnVerification { prompt }
            }
            CompletionState::PartialContinuationPending => {
                let scheduled = self.machine.start_partial_continuation();
                match scheduled {
                    Ok(true) => {
                        let prompt = self.build_partial_continuation_prompt();
                        ExitAction::SpawnPartialContinuation { prompt }
                    }
                    Ok(false) | Err(_) => ExitAction::Complete,
                }
            }
            CompletionState::Idle
            | CompletionState::CompleteTaskCalled
            | CompletionState::Verifying
            | CompletionState::MaxRetriesReached
            | CompletionState::Done => ExitAction::Complete,
        }
    }

    /// Reset the protocol for a fresh round on the same session (used when
    /// the host sends a brand new user message into an already-completed
    /// task rather than disposing it).
    pub fn reset(&mut self) {
        self.machine.reset();
        self.recorded = None;
    }

    fn build_verification_prompt(&self) -> String {
        let (summary, original_request) = self
            .recorded
            .as_ref()
            .map(|args| (args.summary.as_str(), args.original_request_summary.as_str()))
            .unwrap_or(("", ""));
        prompts::verification_prompt(summary, original_request)
    }

    fn build_partial_continuation_prompt(&self) -> String {
        let (summary, remaining_work) = self
            .recorded
            .as_ref()
            .map(|args| (args.summary.as_str(), args.remaining_work.as_deref().unwrap_or("")))
            .unwrap_or(("", ""));
        prompts::partial_continuation_prompt(summary, remaining_work)
    }
}

//! The completion protocol: a state machine tracking whether a task's
//! `complete_task` call should be honored yet, and an enforcer that drives
//! it from the events an adapter observes (`complete_task` calls,
//! `step_finish` events, process exits) and produces the resumption
//! prompts needed when it isn't.

mod enforcer;
mod prompts;
mod state_machine;

pub use enforcer::{CompletionEnforcer, ExitAction, StepOutcome};
pub use prompts::{partial_continuation_prompt, verification_prompt, CONTINUATION_PROMPT};
pub use state_machine::{
    CompleteOutcome, CompletionState, CompletionStateMachine, TransitionError,
    DEFAULT_MAX_CONTINUATION_ATTEMPTS,
};

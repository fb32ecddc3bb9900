use thiserror::Error;

/// Every state the completion protocol can occupy. Expressed as a single
/// enum plus an attempt counter (see [`CompletionStateMachine`]) rather
/// than a bag of booleans, so every legal transition is exhaustively
/// enumerable and testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionState {
    Idle,
    CompleteTaskCalled,
    PartialContinuationPending,
    AwaitingVerification,
    Verifying,
    VerificationContinuing,
    ContinuationPending,
    MaxRetriesReached,
    Done,
}

impl CompletionState {
    /// True in every state other than the three where `complete_task` has
    /// not yet been (successfully) recorded for the current round.
    #[must_use]
    pub fn is_complete_task_called(self) -> bool {
        !matches!(
            self,
            Self::Idle | Self::ContinuationPending | Self::PartialContinuationPending
        )
    }

    #[must_use]
    pub fn is_in_verification_mode(self) -> bool {
        matches!(self, Self::Verifying | Self::VerificationContinuing)
    }

    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done | Self::MaxRetriesReached)
    }
}

/// The model's `complete_task` status, as relevant to the state machine's
/// transitions (see `overseer_types::CompleteTaskStatus` for the full
/// wire-level type, which additionally preserves unrecognized status text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    Success,
    Partial,
    /// `blocked`, or any other value the model supplied: all terminal,
    /// non-retrying claims collapse to the same transition.
    Other,
}

impl From<&overseer_types::CompleteTaskStatus> for CompleteOutcome {
    fn from(status: &overseer_types::CompleteTaskStatus) -> Self {
        match status {
            overseer_types::CompleteTaskStatus::Success => Self::Success,
            overseer_types::CompleteTaskStatus::Partial => Self::Partial,
            overseer_types::CompleteTaskStatus::Blocked
            | overseer_types::CompleteTaskStatus::Other(_) => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("record_complete_task_call is not legal from {0:?}")]
    InvalidCompleteTaskCall(CompletionState),
    #[error("start_verification is only legal from AwaitingVerification, was in {0:?}")]
    InvalidStartVerification(CompletionState),
    #[error("verification_continuing is only legal from Verifying, was in {0:?}")]
    InvalidVerificationContinuing(CompletionState),
    #[error("schedule_continuation is not legal from {0:?}")]
    InvalidScheduleContinuation(CompletionState),
    #[error("start_continuation is only legal from ContinuationPending, was in {0:?}")]
    InvalidStartContinuation(CompletionState),
    #[error("start_partial_continuation is only legal from PartialContinuationPending, was in {0:?}")]
    InvalidStartPartialContinuation(CompletionState),
}

/// Default cap shared by both continuation paths, so callers never have
/// to reconcile two different numbers for the same kind of respawn loop
/// (see `DESIGN.md`).
pub const DEFAULT_MAX_CONTINUATION_ATTEMPTS: u32 = 20;

/// The completion protocol's state machine: one current [`CompletionState`]
/// plus an attempt counter shared across the continuation and
/// partial-continuation paths.
#[derive(Debug, Clone)]
pub struct CompletionStateMachine {
    state: CompletionState,
    attempts: u32,
    max_attempts: u32,
}

impl Default for CompletionStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTINUATION_ATTEMPTS)
    }
}

impl CompletionStateMachine {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: CompletionState::Idle,
            attempts: 0,
            max_attempts,
        }
    }

    #[must_use]
    pub fn state(&self) -> CompletionState {
        self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn record_complete_task_call(
        &mut self,
        outcome: CompleteOutcome,
    ) -> Result<CompletionState, TransitionError> {
        let next = match self.state {
            CompletionState::Idle => match outcome {
                CompleteOutcome::Success => CompletionState::AwaitingVerification,
                CompleteOutcome::Partial => CompletionState::PartialContinuationPending,
                CompleteOutcome::Other => CompletionState::CompleteTaskCalled,
            },
            CompletionState::Verifying => match outcome {
                CompleteOutcome::Success => CompletionState::Done,
                CompleteOutcome::Partial => CompletionState::PartialContinuationPending,
                CompleteOutcome::Other => CompletionState::CompleteTaskCalled,
            },
            other => return Err(TransitionError::InvalidCompleteTaskCall(other)),
        };
        self.state = next;
        Ok(next)
    }

    pub fn start_verification(&mut self) -> Result<(), TransitionError> {
        if self.state != CompletionState::AwaitingVerification {
            return Err(TransitionError::InvalidStartVerification(self.state));
        }
        self.state = CompletionState::Verifying;
        Ok(())
    }

    pub fn verification_continuing(&mut self) -> Result<(), TransitionError> {
        if self.state != CompletionState::Verifying {
            return Err(TransitionError::InvalidVerificationContinuing(self.state));
        }
        self.state = CompletionState::VerificationContinuing;
        Ok(())
    }

    /// Schedule a continuation respawn. Returns `Ok(true)` if scheduled,
    /// `Ok(false)` if this exhausted `max_attempts` (state becomes
    /// [`CompletionState::MaxRetriesReached`]).
    pub fn schedule_continuation(&mut self) -> Result<bool, TransitionError> {
        if !matches!(
            self.state,
            CompletionState::Idle
                | CompletionState::VerificationContinuing
                | CompletionState::ContinuationPending
        ) {
            return Err(TransitionError::InvalidScheduleContinuation(self.state));
        }
        self.attempts += 1;
        if self.attempts > self.max_attempts {
            self.state = CompletionState::MaxRetriesReached;
            Ok(false)
        } else {
            self.state = CompletionState::ContinuationPending;
            Ok(true)
        }
    }

    pub fn start_continuation(&mut self) -> Result<(), TransitionError> {
        if self.state != CompletionState::ContinuationPending {
            return Err(TransitionError::InvalidStartContinuation(self.state));
        }
        self.state = CompletionState::Idle;
        Ok(())
    }

    /// Like [`Self::schedule_continuation`] but for the partial-completion
    /// path, and it resumes directly to [`CompletionState::Idle`] instead
    /// of waiting in `ContinuationPending` (the adapter immediately
    /// respawns with the partial-continuation prompt).
    pub fn start_partial_continuation(&mut self) -> Result<bool, TransitionError> {
        if self.state != CompletionState::PartialContinuationPending {
            return Err(TransitionError::InvalidStartPartialContinuation(self.state));
        }
        self.attempts += 1;
        if self.attempts > self.max_attempts {
            self.state = CompletionState::MaxRetriesReached;
            Ok(false)
        } else {
            self.state = CompletionState::Idle;
            Ok(true)
        }
    }

    pub fn reset(&mut self) {
        self.state = CompletionState::Idle;
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_from_idle_awaits_verification() {
        let mut fsm = CompletionStateMachine::default();
        let state = fsm
            .record_complete_task_call(CompleteOutcome::Success)
            .unwrap();
        assert_eq!(state, CompletionState::AwaitingVerification);
        assert!(state.is_complete_task_called());
    }

    #[test]
    fn partial_from_idle_pends_partial_continuation() {
        let mut fsm = CompletionStateMachine::default();
        let state = fsm
            .record_complete_task_call(CompleteOutcome::Partial)
            .unwrap();
        assert_eq!(state, CompletionState::PartialContinuationPending);
    }

    #[test]
    fn blocked_from_idle_is_complete_task_called() {
        let mut fsm = CompletionStateMachine::default();
        let state = fsm
            .record_complete_task_call(CompleteOutcome::Other)
            .unwrap();
        assert_eq!(state, CompletionState::CompleteTaskCalled);
    }

    #[test]
    fn success_from_verifying_is_done() {
        let mut fsm = CompletionStateMachine::default();
        fsm.record_complete_task_call(CompleteOutcome::Success).unwrap();
        fsm.start_verification().unwrap();
        let state = fsm
            .record_complete_task_call(CompleteOutcome::Success)
            .unwrap();
        assert_eq!(state, CompletionState::Done);
        assert!(state.is_done());
    }

    #[test]
    fn complete_task_call_is_rejected_outside_idle_or_verifying() {
        let mut fsm = CompletionStateMachine::default();
        fsm.record_complete_task_call(CompleteOutcome::Partial).unwrap();
        let err = fsm.record_complete_task_call(CompleteOutcome::Success).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidCompleteTaskCall(CompletionState::PartialContinuationPending)
        );
    }

    #[test]
    fn start_verification_requires_awaiting_state() {
        let mut fsm = CompletionStateMachine::default();
        assert!(fsm.start_verification().is_err());
    }

    #[test]
    fn schedule_continuation_increments_and_caps_attempts() {
        let mut fsm = CompletionStateMachine::new(2);
        assert_eq!(fsm.schedule_continuation(), Ok(true));
        assert_eq!(fsm.state(), CompletionState::ContinuationPending);
        fsm.start_continuation().unwrap();
        assert_eq!(fsm.schedule_continuation(), Ok(true));
        fsm.start_continuation().unwrap();
        assert_eq!(fsm.schedule_continuation(), Ok(false));
        assert_eq!(fsm.state(), CompletionState::MaxRetriesReached);
        assert_eq!(fsm.attempts(), 3);
    }

    #[test]
    fn start_continuation_returns_to_idle() {
        let mut fsm = CompletionStateMachine::default();
        fsm.schedule_continuation().unwrap();
        fsm.start_continuation().unwrap();
        assert_eq!(fsm.state(), CompletionState::Idle);
    }

    #[test]
    fn partial_continuation_path_caps_and_resets_to_idle() {
        let mut fsm = CompletionStateMachine::new(1);
        fsm.record_complete_task_call(CompleteOutcome::Partial).unwrap();
        assert_eq!(fsm.start_partial_continuation(), Ok(true));
        assert_eq!(fsm.state(), CompletionState::Idle);

        fsm.record_complete_task_call(CompleteOutcome::Partial).unwrap();
        assert_eq!(fsm.start_partial_continuation(), Ok(false));
        assert_eq!(fsm.state(), CompletionState::MaxRetriesReached);
    }

    #[test]
    fn reset_from_any_state_returns_to_idle_with_zeroed_attempts() {
        let mut fsm = CompletionStateMachine::default();
        fsm.schedule_continuation().unwrap();
        fsm.reset();
        assert_eq!(fsm.state(), CompletionState::Idle);
        assert_eq!(fsm.attempts(), 0);
    }

    #[test]
    fn predicates_match_spec_groupings() {
        for state in [
            CompletionState::Idle,
            CompletionState::ContinuationPending,
            CompletionState::PartialContinuationPending,
        ] {
            assert!(!state.is_complete_task_called(), "{state:?}");
        }
        for state in [
            CompletionState::CompleteTaskCalled,
            CompletionState::AwaitingVerification,
            CompletionState::Verifying,
            CompletionState::VerificationContinuing,
            CompletionState::MaxRetriesReached,
            CompletionState::Done,
        ] {
            assert!(state.is_complete_task_called(), "{state:?}");
        }
        assert!(CompletionState::Verifying.is_in_verification_mode());
        assert!(CompletionState::VerificationContinuing.is_in_verification_mode());
        assert!(!CompletionState::Idle.is_in_verification_mode());
        assert!(CompletionState::Done.is_done());
        assert!(CompletionState::MaxRetriesReached.is_done());
    }
}

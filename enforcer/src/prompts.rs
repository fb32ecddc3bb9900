//! The three session-resumption prompts the enforcer hands back to the
//! adapter. Their wording is part of the completion protocol: gentle
//! enough not to read as an interruption of ongoing work, firm enough to
//! force a terminal tool call within a bounded number of rounds.

/// Sent when a turn ended without any `complete_task` call at all.
pub const CONTINUATION_PROMPT: &str = "\
You haven't called complete_task yet for this request. Before continuing, take a moment \
to check: have you actually finished what was asked?

If you have, call complete_task now with one of these statuses:
- \"success\" if the work is done and verified
- \"blocked\" if you've hit something you can't resolve on your own
- \"partial\" if you've made real progress but there's more to do

If you haven't finished, keep working — there's no need to stop and ask unless you're \
genuinely blocked.";

/// Sent after the model claims `success`, before the protocol accepts it.
/// Interpolates the model's own summary and the user's original request so
/// the verification turn has concrete criteria to check against.
#[must_use]
pub fn verification_prompt(summary: &str, original_request: &str) -> String {
    format!(
        "You reported this task as complete:\n\n\"{summary}\"\n\n\
The original request was:\n\n\"{original_request}\"\n\n\
Before this is accepted, verify it. Take a screenshot (or otherwise inspect the current \
state) and compare it against the plan's completion criteria.\n\n\
If the criteria are genuinely met, call complete_task again with status \"success\".\n\
If they are not, keep working until they are, then call complete_task when you're done."
    )
}

/// Sent after the model claims `partial`. Shows what it says it finished
/// and what it says remains, and forces a fresh TODO list for the
/// remaining work before resuming — this turn is not allowed to end in
/// another `partial` claim.
#[must_use]
pub fn partial_continuation_prompt(summary: &str, remaining_work: &str) -> String {
    format!(
        "Here's what you've completed so far:\n\n\"{summary}\"\n\n\
Here's what you said remains:\n\n\"{remaining_work}\"\n\n\
Before resuming, write a TODO list (todowrite) covering exactly the remaining work, then \
continue until it's done.\n\n\
When you're finished, call complete_task with status \"success\" if everything is now \
done, or \"blocked\" if you've hit something you genuinely cannot resolve. Do not call \
complete_task with status \"partial\" again, and do not stop to ask the user whether to \
continue — keep going until you can report one of those two outcomes."
    )
}

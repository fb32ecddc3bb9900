use overseer_util::title_case_snake;

/// Tools that are suppressed entirely from the message stream — typically
/// internal context-management calls the model makes that the host has no
/// reason to show a user.
pub const HIDDEN_TOOLS: &[&str] = &["discard", "extract", "context_info", "prune", "distill"];

/// Tools that, beyond [`HIDDEN_TOOLS`], don't count as progress toward the
/// user's actual goal — they're bookkeeping, not work.
const NON_CONTINUATION_EXTRA: &[&str] = &[
    "todowrite",
    "complete_task",
    "AskUserQuestion",
    "report_checkpoint",
    "report_thought",
    "request_file_permission",
    "start_task",
    "skill",
];

pub const START_TASK_TOOL: &str = "start_task";
pub const COMPLETE_TASK_TOOL: &str = "complete_task";

/// Short human labels for specific tool names that would otherwise show up
/// as their raw identifier. Anything not listed here falls back to
/// title-casing the tool name on `_`.
const DISPLAY_OVERRIDES: &[(&str, &str)] = &[
    ("browser_evaluate", "Evaluating page"),
    ("browser_navigate", "Loading page"),
    ("browser_click", "Interacting with page"),
    ("webfetch", "Fetching page"),
    ("bash", "Running command"),
];

/// The role a tool call plays in the completion protocol and message
/// stream. Computed from the tool name alone: every closed set in this
/// module is matched exactly **or** as a suffix after an underscore, so a
/// namespaced variant like `providerA_todowrite` is still recognized as
/// `todowrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRole {
    /// Suppressed from the message stream entirely.
    Hidden,
    /// The tool that announces a plan before real work starts.
    StartTask,
    /// The tool the completion enforcer watches for.
    CompleteTask,
    /// Bookkeeping that doesn't count as continuation progress.
    NonContinuation,
    /// Anything else: ordinary work.
    Continuation,
}

impl ToolRole {
    #[must_use]
    pub fn is_non_continuation(self) -> bool {
        !matches!(self, Self::Continuation)
    }
}

/// True if `tool` is exactly `known`, or `known` with a `{namespace}_`
/// prefix.
fn matches_known(tool: &str, known: &str) -> bool {
    tool == known || tool.ends_with(&format!("_{known}"))
}

#[must_use]
pub fn is_hidden(tool: &str) -> bool {
    HIDDEN_TOOLS.iter().any(|known| matches_known(tool, known))
}

#[must_use]
pub fn is_start_task(tool: &str) -> bool {
    matches_known(tool, START_TASK_TOOL)
}

#[must_use]
pub fn is_complete_task(tool: &str) -> bool {
    matches_known(tool, COMPLETE_TASK_TOOL)
}

#[must_use]
pub fn is_non_continuation(tool: &str) -> bool {
    is_hidden(tool) || NON_CONTINUATION_EXTRA.iter().any(|known| matches_known(tool, known))
}

/// Classify a tool call's role in one pass.
#[must_use]
pub fn classify_tool(tool: &str) -> ToolRole {
    if is_hidden(tool) {
        ToolRole::Hidden
    } else if is_start_task(tool) {
        ToolRole::StartTask
    } else if is_complete_task(tool) {
        ToolRole::CompleteTask
    } else if is_non_continuation(tool) {
        ToolRole::NonContinuation
    } else {
        ToolRole::Continuation
    }
}

/// A short, human-facing label for a tool call, or `None` if the tool is
/// hidden and should not be displayed at all.
#[must_use]
pub fn display_name(tool: &str) -> Option<String> {
    if is_hidden(tool) {
        return None;
    }
    let overridden = DISPLAY_OVERRIDES
        .iter()
        .find(|(known, _)| matches_known(tool, known))
        .map(|(_, label)| (*label).to_string());
    Some(overridden.unwrap_or_else(|| title_case_snake(tool)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_tools_are_hidden() {
        for tool in HIDDEN_TOOLS {
            assert!(is_hidden(tool));
            assert_eq!(classify_tool(tool), ToolRole::Hidden);
            assert_eq!(display_name(tool), None);
        }
    }

    #[test]
    fn namespaced_hidden_tool_still_matches() {
        assert!(is_hidden("providerA_discard"));
        assert_eq!(classify_tool("providerA_discard"), ToolRole::Hidden);
    }

    #[test]
    fn start_task_and_complete_task_are_distinct_roles() {
        assert_eq!(classify_tool("start_task"), ToolRole::StartTask);
        assert_eq!(classify_tool("providerB_start_task"), ToolRole::StartTask);
        assert_eq!(classify_tool("complete_task"), ToolRole::CompleteTask);
        assert_eq!(
            classify_tool("providerB_complete_task"),
            ToolRole::CompleteTask
        );
    }

    #[test]
    fn non_continuation_set_includes_hidden_and_bookkeeping_tools() {
        assert!(is_non_continuation("todowrite"));
        assert!(is_non_continuation("AskUserQuestion"));
        assert!(is_non_continuation("discard"));
        assert!(!is_non_continuation("bash"));
    }

    #[test]
    fn ordinary_tool_is_continuation() {
        assert_eq!(classify_tool("bash"), ToolRole::Continuation);
        assert!(!ToolRole::Continuation.is_non_continuation());
        assert!(ToolRole::NonContinuation.is_non_continuation());
    }

    #[test]
    fn classification_is_suffix_stable_under_namespace_prefix() {
        for tool in [
            "bash",
            "todowrite",
            "complete_task",
            "start_task",
            "discard",
            "browser_evaluate",
        ] {
            let namespaced = format!("providerX_{tool}");
            assert_eq!(
                classify_tool(tool),
                classify_tool(&namespaced),
                "classify({tool}) should equal classify(providerX_{tool})"
            );
        }
    }

    #[test]
    fn display_name_overrides() {
        assert_eq!(
            display_name("browser_evaluate").as_deref(),
            Some("Evaluating page")
        );
        assert_eq!(display_name("bash").as_deref(), Some("Running command"));
    }

    #[test]
    fn display_name_falls_back_to_title_case() {
        assert_eq!(display_name("run_tests").as_deref(), Some("Run Tests"));
    }
}

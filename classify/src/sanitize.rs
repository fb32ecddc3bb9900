//! Output sanitization: turning raw tool output and assistant text into
//! something presentable, stripping artifacts that only make sense inside
//! the CLI's own terminal rendering.

use std::sync::LazyLock;

use overseer_util::{collapse_blank_lines, collapse_spaces, strip_ansi, truncate_with_marker};
use regex::Regex;

/// Default cap on a single tool output's size once it's ready to attach
/// to a message. Unbounded shell/browser output is common in practice,
/// so anything past this is truncated with a marker rather than shipped
/// whole.
pub const MAX_TOOL_OUTPUT_CHARS: usize = 20_000;

static WEBSOCKET_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ws://\S+").expect("static regex is valid"));
static REF_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:ref|cursor)=[^\]]*\]").expect("static regex is valid"));
static TIMEOUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)timed out after (\d+)\s*ms").expect("static regex is valid")
});

const INTERNAL_TAGS: &[&str] = &[
    "instruction",
    "thought",
    "nudge",
    "scratchpad",
    "thinking",
    "reflection",
];

/// Sanitize textual tool output before it is attached to a message:
/// strips ANSI, removes internal reference tokens and websocket URLs,
/// truncates a trailing `"Call log:"` section, collapses runs of spaces,
/// and reduces a handful of common error patterns to short human text.
#[must_use]
pub fn sanitize_tool_output(raw: &str) -> String {
    let mut text = strip_ansi(raw);
    text = WEBSOCKET_URL.replace_all(&text, "").into_owned();
    text = REF_TOKEN.replace_all(&text, "").into_owned();
    text = truncate_call_log(&text);
    text = humanize_error_patterns(&text);
    collapse_spaces(&text).trim().to_string()
}

/// Truncate a sanitized tool output to [`MAX_TOOL_OUTPUT_CHARS`] before it
/// is attached to a message.
#[must_use]
pub fn truncate_tool_output(raw: &str) -> String {
    truncate_with_marker(raw, MAX_TOOL_OUTPUT_CHARS)
}

/// Drop everything from a trailing `"Call log:"` marker onward — verbose
/// browser-automation diagnostics that add noise without adding signal.
fn truncate_call_log(raw: &str) -> String {
    raw.find("Call log:")
        .map_or_else(|| raw.to_string(), |pos| raw[..pos].trim_end().to_string())
}

/// Reduce a handful of common low-level error strings to a short,
/// human-readable message. Anything not recognized passes through
/// unchanged.
#[must_use]
pub fn humanize_error_patterns(raw: &str) -> String {
    if let Some(captures) = TIMEOUT_PATTERN.captures(raw) {
        let millis: u64 = captures[1].parse().unwrap_or(0);
        return format!("Timed out after {}s", millis / 1000);
    }
    if raw.contains("ECONNREFUSED") {
        return "Connection refused".to_string();
    }
    if raw.contains("ENOTFOUND") {
        return "Host not found".to_string();
    }
    raw.to_string()
}

/// Strip internal-only XML-ish blocks from assistant-facing text (model
/// scratch space that was never meant to be shown to a user), then
/// collapse the blank lines left behind.
#[must_use]
pub fn strip_internal_xml(raw: &str) -> String {
    let mut text = raw.to_string();
    for tag in INTERNAL_TAGS {
        let pattern = format!(r"(?s)<{tag}>.*?</{tag}>");
        let re = Regex::new(&pattern).expect("tag pattern is a valid regex");
        text = re.replace_all(&text, "").into_owned();
    }
    collapse_blank_lines(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_websocket_urls_and_ref_tokens() {
        let raw = "connected to ws://localhost:9222/devtools [ref=e3] ready [cursor=12]";
        let clean = sanitize_tool_output(raw);
        assert!(!clean.contains("ws://"));
        assert!(!clean.contains("[ref="));
        assert!(!clean.contains("[cursor="));
    }

    #[test]
    fn truncates_call_log_tail() {
        let raw = "clicked button\nCall log:\n  - waiting for element\n  - attached";
        assert_eq!(sanitize_tool_output(raw), "clicked button");
    }

    #[test]
    fn humanizes_timeout_errors() {
        assert_eq!(
            humanize_error_patterns("Error: timed out after 60000ms waiting for selector"),
            "Timed out after 60s"
        );
    }

    #[test]
    fn humanizes_connection_refused() {
        assert_eq!(
            humanize_error_patterns("connect ECONNREFUSED 127.0.0.1:3000"),
            "Connection refused"
        );
    }

    #[test]
    fn collapses_space_runs() {
        assert_eq!(sanitize_tool_output("a      b"), "a b");
    }

    #[test]
    fn strips_internal_xml_blocks() {
        let raw = "Here's my plan.\n<thinking>\nlet me consider X\n</thinking>\n\n\n\nDone.";
        let clean = strip_internal_xml(raw);
        assert!(!clean.contains("thinking"));
        assert!(!clean.contains("let me consider"));
        assert_eq!(clean, "Here's my plan.\n\nDone.");
    }

    #[test]
    fn strips_multiple_distinct_internal_tags() {
        let raw = "<instruction>secret</instruction>visible<nudge>hidden</nudge>";
        assert_eq!(strip_internal_xml(raw), "visible");
    }

    #[test]
    fn truncates_oversized_tool_output() {
        let raw = "x".repeat(MAX_TOOL_OUTPUT_CHARS + 500);
        let out = truncate_tool_output(&raw);
        assert!(out.contains("truncated 500 chars"));
    }

    #[test]
    fn leaves_small_tool_output_untouched() {
        assert_eq!(truncate_tool_output("all good"), "all good");
    }
}

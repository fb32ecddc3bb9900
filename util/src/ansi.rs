//! ANSI escape sequence detection and stripping.
//!
//! The AI CLI runs under a pseudoterminal, so its stdout carries the usual
//! cursor-movement and color escape codes a real terminal would consume.
//! Everything downstream of the adapter's read loop wants plain text.

use regex::Regex;
use std::sync::LazyLock;

// CSI: ESC '[' parameter-bytes intermediate-bytes final-byte.
// OSC: ESC ']' ... (BEL | ESC '\').
static ANSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?x)
        \x1b\[[0-9;?]*[ -/]*[@-~]     # CSI sequence
        |\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)  # OSC sequence
        |\x1b[@-Z\\-_]                # two-byte escape (e.g. ESC M)
    ",
    )
    .expect("ANSI pattern is a valid static regex")
});

/// Strip all ANSI CSI/OSC escape sequences from `raw`, leaving the visible
/// text untouched.
#[must_use]
pub fn strip_ansi(raw: &str) -> String {
    ANSI_PATTERN.replace_all(raw, "").into_owned()
}

/// True if `trimmed` (already trimmed of leading whitespace) begins with
/// the start of an ANSI CSI or OSC escape sequence, i.e. `ESC [` or
/// `ESC ]`. Used by the parser's decoration filter, which needs to reject
/// a line before attempting to strip it.
#[must_use]
pub fn starts_with_ansi_escape(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    matches!(chars.next(), Some('\x1b')) && matches!(chars.next(), Some('[' | ']'))
}

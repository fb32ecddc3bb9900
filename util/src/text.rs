//! Small pure text helpers shared across the supervisor.

/// Truncate `s` and append `suffix` if it exceeds `threshold` characters.
fn truncate_core(s: &str, threshold: usize, take: usize, suffix: &str) -> String {
    if s.chars().count() <= threshold {
        return s.to_string();
    }
    let head: String = s.chars().take(take).collect();
    format!("{head}{suffix}")
}

/// Truncate a string to fit within `max_total` characters, appending `suffix` if truncated.
///
/// The suffix counts toward the budget: the returned string is at most `max_total` characters.
#[must_use]
pub fn truncate_to_fit(raw: &str, max_total: usize, suffix: &str) -> String {
    let take = max_total.saturating_sub(suffix.chars().count());
    truncate_core(raw, max_total, take, suffix)
}

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// Trims surrounding whitespace first and counts by `char` (not bytes) to
/// avoid splitting a Unicode scalar value.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    truncate_to_fit(raw.trim(), max, "...")
}

/// Truncate tool output to a configurable character budget, appending a
/// marker noting how much was dropped. Used for the 500-character
/// debug-sink cap and the `MAX_TOOL_OUTPUT_CHARS` tool-output cap.
#[must_use]
pub fn truncate_with_marker(raw: &str, max_chars: usize) -> String {
    let len = raw.chars().count();
    if len <= max_chars {
        return raw.to_string();
    }
    let dropped = len - max_chars;
    let head: String = raw.chars().take(max_chars).collect();
    format!("{head}\n… [truncated {dropped} chars]")
}

/// Collapse runs of three or more consecutive newlines down to two.
#[must_use]
pub fn collapse_blank_lines(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut newline_run = 0usize;
    for ch in raw.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}

/// Collapse runs of spaces/tabs down to a single space, leaving newlines
/// untouched.
#[must_use]
pub fn collapse_spaces(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut space_run = false;
    for ch in raw.chars() {
        if ch == ' ' || ch == '\t' {
            if !space_run {
                out.push(' ');
            }
            space_run = true;
        } else {
            space_run = false;
            out.push(ch);
        }
    }
    out
}

/// Title-case a `snake_case` identifier for display, e.g. `browser_click` →
/// `Browser Click`.
#[must_use]
pub fn title_case_snake(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_trims_whitespace() {
        assert_eq!(truncate_with_ellipsis("  hello  ", 10), "hello");
    }

    #[test]
    fn truncate_with_marker_notes_dropped_count() {
        let raw = "x".repeat(10);
        let result = truncate_with_marker(&raw, 4);
        assert!(result.starts_with("xxxx"));
        assert!(result.contains("truncated 6 chars"));
    }

    #[test]
    fn truncate_with_marker_short_unchanged() {
        assert_eq!(truncate_with_marker("short", 100), "short");
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn collapses_spaces_not_newlines() {
        assert_eq!(collapse_spaces("a    b\n\nc"), "a b\n\nc");
    }

    #[test]
    fn title_cases_snake_case() {
        assert_eq!(title_case_snake("browser_click"), "Browser Click");
        assert_eq!(title_case_snake("bash"), "Bash");
    }
}

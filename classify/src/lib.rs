//! Closed-set tool classification plus the sanitization passes applied to
//! everything a child CLI emits: tool output, assistant text, and embedded
//! screenshots.

mod sanitize;
mod screenshot;
mod tool_class;

pub use sanitize::{
    humanize_error_patterns, sanitize_tool_output, strip_internal_xml, truncate_tool_output,
    MAX_TOOL_OUTPUT_CHARS,
};
pub use screenshot::extract_screenshots;
pub use tool_class::{
    ToolRole, classify_tool, display_name, is_complete_task, is_hidden, is_non_continuation,
    is_start_task, COMPLETE_TASK_TOOL, HIDDEN_TOOLS, START_TASK_TOOL,
};

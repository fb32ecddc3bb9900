//! Text sanitization primitives shared by the parser, classifier, and
//! adapter crates.
//!
//! Pure functions only: no IO, no async runtime dependency.

mod ansi;
mod text;

pub use ansi::{starts_with_ansi_escape, strip_ansi};
pub use text::{
    collapse_blank_lines, collapse_spaces, title_case_snake, truncate_to_fit,
    truncate_with_ellipsis, truncate_with_marker,
};

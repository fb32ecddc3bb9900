//! Screenshot (and other embedded-blob) extraction out of tool output.
//!
//! Tool output from a browser-automation tool often embeds a base64 image
//! directly in the text. We don't want to forward multi-megabyte base64
//! blobs as if they were prose, so we pull them out as [`Attachment`]s and
//! leave a short placeholder in their place.

use std::sync::LazyLock;

use overseer_types::Attachment;
use regex::Regex;

const PLACEHOLDER: &str = "[Screenshot captured]";
const MIN_BARE_BASE64_LEN: usize = 100;

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/(?:png|jpeg|jpg|webp);base64,[A-Za-z0-9+/=]+")
        .expect("static regex is valid")
});
static BARE_PNG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("iVBORw0[A-Za-z0-9+/=]{{{MIN_BARE_BASE64_LEN},}}"))
        .expect("static regex is valid")
});
static PLACEHOLDER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:{}\s*){{2,}}", regex::escape(PLACEHOLDER)))
        .expect("static regex is valid")
});

/// Extract every embedded screenshot from `raw`, returning the text with
/// each occurrence replaced by a placeholder and the extracted
/// attachments in the order they appeared. Idempotent: running this again
/// on its own output returns the text unchanged and no new attachments,
/// since the placeholder itself never matches either pattern.
#[must_use]
pub fn extract_screenshots(raw: &str) -> (String, Vec<Attachment>) {
    let mut attachments = Vec::new();

    let after_data_urls = DATA_URL.replace_all(raw, |caps: &regex::Captures<'_>| {
        attachments.push(Attachment::screenshot(caps[0].to_string()));
        PLACEHOLDER
    });

    let after_bare = BARE_PNG.replace_all(&after_data_urls, |caps: &regex::Captures<'_>| {
        attachments.push(Attachment::screenshot(caps[0].to_string()));
        PLACEHOLDER
    });

    let deduped = PLACEHOLDER_RUN.replace_all(&after_bare, PLACEHOLDER);
    (deduped.into_owned(), attachments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_data_url_and_replaces_with_placeholder() {
        let raw = "before data:image/png;base64,iVBORw0KGgoAAAANSUhEUg== after";
        let (text, attachments) = extract_screenshots(raw);
        assert_eq!(text, format!("before {PLACEHOLDER} after"));
        assert_eq!(attachments.len(), 1);
        assert!(attachments[0].data.starts_with("data:image/png"));
    }

    #[test]
    fn extracts_bare_base64_png_blob() {
        let blob = format!("iVBORw0{}", "A".repeat(150));
        let raw = format!("screenshot: {blob} done");
        let (text, attachments) = extract_screenshots(&raw);
        assert_eq!(text, format!("screenshot: {PLACEHOLDER} done"));
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn short_base64_like_runs_are_left_alone() {
        let raw = "iVBORw0short";
        let (text, attachments) = extract_screenshots(raw);
        assert_eq!(text, raw);
        assert!(attachments.is_empty());
    }

    #[test]
    fn dedupes_consecutive_placeholders() {
        let raw = "data:image/png;base64,AAAA then data:image/jpeg;base64,BBBB";
        let (text, attachments) = extract_screenshots(raw);
        assert_eq!(text, format!("{PLACEHOLDER} then {PLACEHOLDER}"));
        assert_eq!(attachments.len(), 2);

        // Adjacent placeholders collapse to one.
        let adjacent = format!("{PLACEHOLDER}\n{PLACEHOLDER}");
        let (collapsed, _) = extract_screenshots(&adjacent);
        assert_eq!(collapsed, PLACEHOLDER);
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let raw = "shot: data:image/webp;base64,CCCCCCCCCCCCCCCC end";
        let (once, attachments_once) = extract_screenshots(raw);
        let (twice, attachments_twice) = extract_screenshots(&once);
        assert_eq!(once, twice);
        assert_eq!(attachments_once.len(), 1);
        assert!(attachments_twice.is_empty());
    }
}

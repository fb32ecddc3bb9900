//! Heuristic recognition of provider authentication failures inside the
//! child's structured error stream. The adapter has no provider concept
//! of its own (credentials are entirely the host's concern via
//! `HostCapabilities::build_environment`), so both whether an error is
//! auth-shaped and which provider it belongs to are guessed from the
//! error text itself.

/// True if `raw` reads like a bad, missing, or unauthorized API key
/// rather than some other child-reported error (a timeout, a tool
/// failure, a malformed request unrelated to credentials).
#[must_use]
pub fn is_auth_error(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    let mentions_key = lower.contains("api key") || lower.contains("x-api-key") || lower.contains("authorization");
    let auth_words = lower.contains("invalid")
        || lower.contains("incorrect")
        || lower.contains("missing")
        || lower.contains("unauthorized")
        || lower.contains("not provided")
        || lower.contains("authentication");
    let has_code = lower.contains("401");
    lower.contains("invalid_api_key")
        || lower.contains("you must provide an api key")
        || (mentions_key && auth_words)
        || (mentions_key && has_code)
        || (has_code && lower.contains("unauthorized"))
}

const PROVIDER_MARKERS: &[(&str, &str)] = &[
    ("anthropic", "anthropic"),
    ("claude", "anthropic"),
    ("openai", "openai"),
    ("gpt", "openai"),
    ("gemini", "google"),
    ("google", "google"),
];

/// Best-effort provider id for an auth failure, guessed from whichever
/// provider name surfaces in the error text. Falls back to `"unknown"`
/// when nothing recognizable is present, which the host is still free to
/// show to the user ("an AI provider rejected the request").
#[must_use]
pub fn guess_provider_id(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    PROVIDER_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, provider)| (*provider).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_auth_failure_phrasings() {
        assert!(is_auth_error("Invalid API key provided"));
        assert!(is_auth_error("401 Unauthorized"));
        assert!(is_auth_error("Error: you must provide an API key"));
        assert!(is_auth_error("authentication_error: x-api-key header is missing"));
    }

    #[test]
    fn does_not_flag_unrelated_errors() {
        assert!(!is_auth_error("connection timed out after 30000ms"));
        assert!(!is_auth_error("tool 'bash' exited with status 127"));
    }

    #[test]
    fn guesses_provider_from_markers_and_falls_back() {
        assert_eq!(guess_provider_id("Anthropic API error: invalid api key"), "anthropic");
        assert_eq!(guess_provider_id("OpenAI rejected the request: 401 unauthorized"), "openai");
        assert_eq!(guess_provider_id("weird upstream failure"), "unknown");
    }
}

use serde::{Deserialize, Serialize};

/// The named stages a task can report progress through before its first
/// substantive message arrives.
///
/// These are host-facing hints, not part of the completion protocol: the
/// task manager and adapter emit them on a best-effort basis so a host UI
/// has something to show during the otherwise-silent startup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStage {
    Starting,
    Environment,
    Loading,
    Connecting,
    Waiting,
    ToolUse,
    Browser,
    BrowserRecovery,
}

impl ProgressStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Environment => "environment",
            Self::Loading => "loading",
            Self::Connecting => "connecting",
            Self::Waiting => "waiting",
            Self::ToolUse => "tool-use",
            Self::Browser => "browser",
            Self::BrowserRecovery => "browser-recovery",
        }
    }
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serde() {
        let json = serde_json::to_string(&ProgressStage::ToolUse).unwrap();
        assert_eq!(json, "\"tool-use\"");
        let back: ProgressStage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProgressStage::ToolUse);
    }
}

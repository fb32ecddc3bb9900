use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The strict status enumeration a task can occupy.
///
/// `unknown` is deliberately not a variant here: it describes what must
/// be *rejected* as an input status, never produced internally.
/// [`TaskStatus::parse`] is the boundary that
/// enforces this for string-keyed callers (e.g. a host replaying a
/// persisted status column it does not fully trust).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Interrupted,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0:?} is not a valid task status")]
pub struct UnknownTaskStatus(String);

impl TaskStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Interrupted => "interrupted",
        }
    }

    /// Parse a status from its wire representation, rejecting `"unknown"`
    /// and anything else that is not one of the six strict variants.
    pub fn parse(raw: &str) -> Result<Self, UnknownTaskStatus> {
        match raw {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "interrupted" => Ok(Self::Interrupted),
            other => Err(UnknownTaskStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

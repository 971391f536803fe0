use std::fmt;

use serde::Deserialize;

use super::TaskStatus;

/// Job state as reported by `GET /status/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Success,
    Failure,
    Revoked,
    /// PENDING, STARTED, PROGRESS and anything else the broker reports.
    Other(String),
}

impl RemoteState {
    pub fn parse(state: &str) -> Self {
        match state {
            "SUCCESS" => RemoteState::Success,
            "FAILURE" => RemoteState::Failure,
            "REVOKED" => RemoteState::Revoked,
            other => RemoteState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteState::Success => "SUCCESS",
            RemoteState::Failure => "FAILURE",
            RemoteState::Revoked => "REVOKED",
            RemoteState::Other(s) => s,
        }
    }

    /// The backend will not report a different state for this job again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteState::Other(_))
    }

    /// Local status this state translates to, if it changes the record at all.
    pub fn local_status(&self) -> Option<TaskStatus> {
        match self {
            RemoteState::Success => Some(TaskStatus::Success),
            RemoteState::Failure => Some(TaskStatus::Failure),
            RemoteState::Revoked => Some(TaskStatus::Cancelled),
            RemoteState::Other(_) => None,
        }
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawStatusReport {
    state: String,
    #[serde(default)]
    filename: Option<String>,
}

/// Decoded body of a status response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawStatusReport")]
pub struct StatusReport {
    pub state: RemoteState,
    pub filename: Option<String>,
}

impl From<RawStatusReport> for StatusReport {
    fn from(raw: RawStatusReport) -> Self {
        Self {
            state: RemoteState::parse(&raw.state),
            filename: raw.filename.filter(|f| !f.is_empty()),
        }
    }
}

//! Session and reference-data types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SESSION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}_\d{6}_[0-9a-f]{8}$").expect("valid session id regex"));

/// Check that a session id has the `YYYYMMDD_HHMMSS_xxxxxxxx` shape.
///
/// Session ids are interpolated into request paths, so anything else
/// (separators, dots, uppercase) is rejected.
pub fn is_valid_session_id(id: &str) -> bool {
    SESSION_ID_RE.is_match(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::Complete => "complete",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Session row as returned by the session list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub total: usize,
}

/// Skill definition available to the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillList {
    pub skills: Vec<Skill>,
}

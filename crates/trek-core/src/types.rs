use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure to parse one of the closed vocabularies below from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown context type: {0}")]
    ContextType(String),
    #[error("unknown ticket status: {0}")]
    TicketStatus(String),
    #[error("unknown filter mode: {0} (expected strict, default, permissive, or full)")]
    FilterMode(String),
    #[error("priority out of range: {0} (expected 1-4)")]
    Priority(u8),
}

// ── Context taxonomy ──

/// The task phase an agent is working in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    TicketWork,
    Planning,
    Review,
    Admin,
}

impl ContextType {
    pub const ALL: [ContextType; 4] = [
        ContextType::TicketWork,
        ContextType::Planning,
        ContextType::Review,
        ContextType::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicketWork => "ticket_work",
            Self::Planning => "planning",
            Self::Review => "review",
            Self::Admin => "admin",
        }
    }

    /// Coarse state label published in the session state projection.
    pub fn state_label(&self) -> &'static str {
        match self {
            Self::TicketWork => "implementing",
            Self::Planning => "planning",
            Self::Review => "reviewing",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContextType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ticket_work" => Ok(Self::TicketWork),
            "planning" => Ok(Self::Planning),
            "review" => Ok(Self::Review),
            // `idle` is only a label for "no session"; it filters like admin.
            "admin" | "idle" => Ok(Self::Admin),
            other => Err(ParseError::ContextType(other.to_string())),
        }
    }
}

// ── Ticket workflow ──

/// Workflow status of a ticket, owned by the external ticket workflow.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Backlog,
    Ready,
    InProgress,
    AiReview,
    HumanReview,
    Done,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::Backlog,
        TicketStatus::Ready,
        TicketStatus::InProgress,
        TicketStatus::AiReview,
        TicketStatus::HumanReview,
        TicketStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::AiReview => "ai_review",
            Self::HumanReview => "human_review",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "ai_review" => Ok(Self::AiReview),
            "human_review" => Ok(Self::HumanReview),
            "done" => Ok(Self::Done),
            other => Err(ParseError::TicketStatus(other.to_string())),
        }
    }
}

// ── Capability priority and filter modes ──

/// Capability priority tier. Lower is more essential.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Critical = 1,
    Important = 2,
    Useful = 3,
    Advanced = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::Important,
        Priority::Useful,
        Priority::Advanced,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Critical),
            2 => Ok(Self::Important),
            3 => Ok(Self::Useful),
            4 => Ok(Self::Advanced),
            other => Err(ParseError::Priority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.as_u8()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Named priority threshold preset.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Strict,
    #[default]
    Default,
    Permissive,
    Full,
}

impl FilterMode {
    pub const ALL: [FilterMode; 4] = [
        FilterMode::Strict,
        FilterMode::Default,
        FilterMode::Permissive,
        FilterMode::Full,
    ];

    /// Highest priority tier admitted under this mode.
    pub fn max_priority(&self) -> Priority {
        match self {
            Self::Strict => Priority::Critical,
            Self::Default => Priority::Important,
            Self::Permissive => Priority::Useful,
            Self::Full => Priority::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Default => "default",
            Self::Permissive => "permissive",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "default" => Ok(Self::Default),
            "permissive" => Ok(Self::Permissive),
            "full" => Ok(Self::Full),
            other => Err(ParseError::FilterMode(other.to_string())),
        }
    }
}

// ── Store snapshots (read-only views of external records) ──

/// A ticket as seen by context inference.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TicketSnapshot {
    pub id: String,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// An agent work session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub id: String,
    pub name: String,
}

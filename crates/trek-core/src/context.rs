use serde::{Deserialize, Serialize};

use crate::types::{ContextType, ProjectSnapshot, SessionSnapshot, TicketSnapshot, TicketStatus};

/// Compatibility shape consumed by session observability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StateProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub current_state: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContextMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// `automated` or `manual`, only in review contexts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_phase: Option<String>,
    /// `needs_planning` or `ready_to_work`, only in planning contexts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_level: Option<String>,
    pub state_projection: StateProjection,
}

/// Inferred task phase for a ticket/session. Derived on every call, never stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Context {
    #[serde(rename = "type")]
    pub context_type: ContextType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub description: String,
    pub metadata: ContextMetadata,
}

impl Context {
    /// Preview context for a caller-supplied type, without live ticket state.
    pub fn explicit(context_type: ContextType) -> Self {
        Self {
            context_type,
            ticket_id: None,
            project_id: None,
            status: None,
            description: format!("Explicit {context_type} context"),
            metadata: ContextMetadata {
                ticket: None,
                project: None,
                session: None,
                reason: Some("explicit_context".to_string()),
                review_phase: None,
                readiness_level: None,
                state_projection: StateProjection {
                    session_id: None,
                    ticket_id: None,
                    current_state: context_type.state_label().to_string(),
                },
            },
        }
    }
}

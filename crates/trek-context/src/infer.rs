use tracing::{debug, warn};
use trek_core::{
    Context, ContextMetadata, ContextType, ProjectSnapshot, SessionSnapshot, StateProjection,
    TicketSnapshot, TicketStatus,
};
use trek_store::TrackerStore;

/// Inputs for a single inference. All fields are optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferRequest<'a> {
    pub ticket_id: Option<&'a str>,
    pub project_id: Option<&'a str>,
    pub session_id: Option<&'a str>,
}

/// Infer the work context for a ticket/session pair.
///
/// Resolution order: an active session's ticket overrides `ticket_id`, and a
/// resolved ticket's project overrides `project_id`. Lookups that fail are
/// logged and treated as absent. For fixed store contents the result is a
/// pure function of `req`.
pub fn infer_context<S: TrackerStore + ?Sized>(store: &S, req: InferRequest<'_>) -> Context {
    // 1. Session
    let session = req.session_id.and_then(|sid| lookup_session(store, sid));

    // 2. Ticket (session's ticket wins over the supplied one)
    let ticket_id = session
        .as_ref()
        .and_then(|s| s.ticket_id.as_deref())
        .or(req.ticket_id);
    let ticket = ticket_id.and_then(|tid| lookup_ticket(store, tid));

    // 3. Project, for descriptive metadata only
    let project_id = ticket
        .as_ref()
        .and_then(|t| t.project_id.clone())
        .or_else(|| req.project_id.map(str::to_string))
        .or_else(|| session.as_ref().and_then(|s| s.project_id.clone()));
    let project = project_id.as_deref().and_then(|pid| lookup_project(store, pid));

    let session_id = session
        .as_ref()
        .map(|s| s.id.clone())
        .or_else(|| req.session_id.map(str::to_string));

    // 4./5. Classify
    match ticket {
        Some(ticket) => classify_ticket(ticket, project_id, project, session, session_id),
        None => Context {
            context_type: ContextType::Admin,
            ticket_id: None,
            project_id,
            status: None,
            description: "Administrative/setup context".to_string(),
            metadata: ContextMetadata {
                ticket: None,
                project,
                session,
                reason: Some("no_active_ticket".to_string()),
                review_phase: None,
                readiness_level: None,
                state_projection: StateProjection {
                    session_id,
                    ticket_id: None,
                    current_state: "admin".to_string(),
                },
            },
        },
    }
}

/// Infer one context per active session, in the store's enumeration order.
///
/// A failing session query yields an empty list, never a partial one.
pub fn infer_all_active_contexts<S: TrackerStore + ?Sized>(store: &S) -> Vec<Context> {
    let sessions = match store.list_active_sessions() {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!(error = %e, "listing active sessions failed; no contexts inferred");
            return Vec::new();
        }
    };

    sessions
        .iter()
        .map(|s| {
            infer_context(
                store,
                InferRequest {
                    ticket_id: s.ticket_id.as_deref(),
                    project_id: s.project_id.as_deref(),
                    session_id: Some(s.id.as_str()),
                },
            )
        })
        .collect()
}

/// Status → context classification. Total over [`TicketStatus`].
fn classify_ticket(
    ticket: TicketSnapshot,
    project_id: Option<String>,
    project: Option<ProjectSnapshot>,
    session: Option<SessionSnapshot>,
    session_id: Option<String>,
) -> Context {
    let (context_type, description, current_state, review_phase, readiness_level) =
        match ticket.status {
            TicketStatus::InProgress => (
                ContextType::TicketWork,
                "Active ticket implementation",
                "implementing",
                None,
                None,
            ),
            TicketStatus::AiReview => (
                ContextType::Review,
                "Code review phase",
                "reviewing",
                Some("automated"),
                None,
            ),
            TicketStatus::HumanReview => (
                ContextType::Review,
                "Code review phase",
                "reviewing",
                Some("manual"),
                None,
            ),
            TicketStatus::Backlog => (
                ContextType::Planning,
                "Ticket planning/readiness",
                "planning",
                None,
                Some("needs_planning"),
            ),
            TicketStatus::Ready => (
                ContextType::Planning,
                "Ticket planning/readiness",
                "planning",
                None,
                Some("ready_to_work"),
            ),
            TicketStatus::Done => (
                ContextType::Admin,
                "Ticket completed - administrative context",
                "complete",
                None,
                None,
            ),
        };

    Context {
        context_type,
        ticket_id: Some(ticket.id.clone()),
        project_id,
        status: Some(ticket.status),
        description: description.to_string(),
        metadata: ContextMetadata {
            state_projection: StateProjection {
                session_id,
                ticket_id: Some(ticket.id.clone()),
                current_state: current_state.to_string(),
            },
            ticket: Some(ticket),
            project,
            session,
            reason: None,
            review_phase: review_phase.map(str::to_string),
            readiness_level: readiness_level.map(str::to_string),
        },
    }
}

// ── Absorbing lookups ──

fn lookup_session<S: TrackerStore + ?Sized>(store: &S, id: &str) -> Option<SessionSnapshot> {
    match store.get_active_session(id) {
        Ok(Some(s)) => Some(s),
        Ok(None) => {
            debug!(session_id = %id, "no active session");
            None
        }
        Err(e) => {
            warn!(session_id = %id, error = %e, "session lookup failed; treating as no session");
            None
        }
    }
}

fn lookup_ticket<S: TrackerStore + ?Sized>(store: &S, id: &str) -> Option<TicketSnapshot> {
    match store.get_ticket(id) {
        Ok(Some(t)) => Some(t),
        Ok(None) => {
            debug!(ticket_id = %id, "ticket not found");
            None
        }
        Err(e) => {
            warn!(ticket_id = %id, error = %e, "ticket lookup failed; treating as no ticket");
            None
        }
    }
}

fn lookup_project<S: TrackerStore + ?Sized>(store: &S, id: &str) -> Option<ProjectSnapshot> {
    match store.get_project(id) {
        Ok(p) => p,
        Err(e) => {
            warn!(project_id = %id, error = %e, "project lookup failed");
            None
        }
    }
}

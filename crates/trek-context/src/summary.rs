use serde::Serialize;
use trek_core::Context;
use trek_store::TrackerStore;

use crate::infer::infer_all_active_contexts;

/// Rendering of an absent context.
pub const NO_CONTEXT: &str = "No context";

/// One-line human rendering of a context.
///
/// Prefers ticket id, status, and project over the bare description.
pub fn summarize(context: Option<&Context>) -> String {
    let Some(ctx) = context else {
        return NO_CONTEXT.to_string();
    };
    match (&ctx.ticket_id, ctx.status, &ctx.project_id) {
        (Some(tid), Some(status), Some(pid)) => {
            format!("Ticket {tid} ({status}) in project {pid}")
        }
        (Some(tid), Some(status), None) => format!("Ticket {tid} ({status})"),
        (None, _, Some(pid)) => format!("Project {pid}: {}", ctx.description),
        _ => format!("{}: {}", ctx.context_type, ctx.description),
    }
}

/// Contexts of every active session, with a one-line summary.
#[derive(Serialize, Clone, Debug)]
pub struct ActiveContextMap {
    pub contexts: Vec<Context>,
    pub summary: String,
}

impl ActiveContextMap {
    pub fn collect<S: TrackerStore + ?Sized>(store: &S) -> Self {
        Self::from_contexts(infer_all_active_contexts(store))
    }

    pub fn from_contexts(contexts: Vec<Context>) -> Self {
        let summary = Self::build_summary(&contexts);
        Self { contexts, summary }
    }

    fn build_summary(contexts: &[Context]) -> String {
        if contexts.is_empty() {
            return "idle: no active sessions".to_string();
        }
        let parts: Vec<String> = contexts
            .iter()
            .map(|c| {
                let id = c
                    .metadata
                    .state_projection
                    .session_id
                    .as_deref()
                    .unwrap_or("?");
                match &c.ticket_id {
                    Some(tid) => format!("{id} {} {tid}", c.context_type),
                    None => format!("{id} {}", c.context_type),
                }
            })
            .collect();
        format!("{} active: {}", contexts.len(), parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trek_core::{ContextType, TicketStatus};
    use trek_store::SqliteStore;

    fn ticket_context() -> Context {
        let mut ctx = Context::explicit(ContextType::TicketWork);
        ctx.ticket_id = Some("t1".into());
        ctx.status = Some(TicketStatus::InProgress);
        ctx.project_id = Some("p1".into());
        ctx
    }

    #[test]
    fn summarize_none() {
        assert_eq!(summarize(None), "No context");
    }

    #[test]
    fn summarize_prefers_ticket() {
        let ctx = ticket_context();
        assert_eq!(summarize(Some(&ctx)), "Ticket t1 (in_progress) in project p1");
    }

    #[test]
    fn summarize_ticket_without_project() {
        let mut ctx = ticket_context();
        ctx.project_id = None;
        assert_eq!(summarize(Some(&ctx)), "Ticket t1 (in_progress)");
    }

    #[test]
    fn summarize_description_fallback() {
        let ctx = Context::explicit(ContextType::Planning);
        assert_eq!(summarize(Some(&ctx)), "planning: Explicit planning context");
    }

    #[test]
    fn active_map_empty_is_idle() {
        let store = SqliteStore::open_in_memory().unwrap();
        let map = ActiveContextMap::collect(&store);
        assert!(map.contexts.is_empty());
        assert_eq!(map.summary, "idle: no active sessions");
    }

    #[test]
    fn active_map_summary() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_ticket("t1", None, None, TicketStatus::HumanReview)
            .unwrap();
        store.start_session("s1", Some("t1"), None).unwrap();
        store.start_session("s2", None, None).unwrap();
        let map = ActiveContextMap::collect(&store);
        assert_eq!(map.summary, "2 active: s1 review t1, s2 admin");
    }
}

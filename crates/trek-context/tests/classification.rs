use trek_context::{infer_all_active_contexts, infer_context, InferRequest};
use trek_core::{ContextType, TicketStatus};
use trek_store::SqliteStore;

fn expected(status: TicketStatus) -> (ContextType, &'static str) {
    match status {
        TicketStatus::Backlog | TicketStatus::Ready => (ContextType::Planning, "planning"),
        TicketStatus::InProgress => (ContextType::TicketWork, "implementing"),
        TicketStatus::AiReview | TicketStatus::HumanReview => (ContextType::Review, "reviewing"),
        TicketStatus::Done => (ContextType::Admin, "complete"),
    }
}

#[test]
fn every_status_is_classified() {
    let store = SqliteStore::open_in_memory().unwrap();
    for status in TicketStatus::ALL {
        let id = format!("t-{status}");
        store.insert_ticket(&id, None, None, status).unwrap();
        let ctx = infer_context(
            &store,
            InferRequest {
                ticket_id: Some(&id),
                ..Default::default()
            },
        );
        let (ct, state) = expected(status);
        assert_eq!(ctx.context_type, ct, "status {status}");
        assert_eq!(ctx.status, Some(status));
        assert_eq!(ctx.metadata.state_projection.current_state, state);
    }
}

#[test]
fn review_phases_and_readiness() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.insert_ticket("a", None, None, TicketStatus::HumanReview).unwrap();
    store.insert_ticket("b", None, None, TicketStatus::Backlog).unwrap();
    store.insert_ticket("c", None, None, TicketStatus::Done).unwrap();

    let infer = |id: &str| {
        infer_context(
            &store,
            InferRequest {
                ticket_id: Some(id),
                ..Default::default()
            },
        )
    };
    assert_eq!(infer("a").metadata.review_phase.as_deref(), Some("manual"));
    assert_eq!(infer("b").metadata.readiness_level.as_deref(), Some("needs_planning"));
    assert_eq!(infer("b").description, "Ticket planning/readiness");
    assert_eq!(
        infer("c").description,
        "Ticket completed - administrative context"
    );
}

#[test]
fn inference_is_deterministic() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.insert_project("p1", "Core").unwrap();
    store
        .insert_ticket("t1", Some("p1"), Some("Parser"), TicketStatus::AiReview)
        .unwrap();
    store.start_session("s1", Some("t1"), Some("p1")).unwrap();

    let req = InferRequest {
        ticket_id: Some("t1"),
        project_id: None,
        session_id: Some("s1"),
    };
    let first = infer_context(&store, req);
    let second = infer_context(&store, req);
    assert_eq!(first, second);

    assert_eq!(infer_all_active_contexts(&store), infer_all_active_contexts(&store));
}

#[test]
fn empty_store_is_admin() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = infer_context(&store, InferRequest::default());
    assert_eq!(ctx.context_type, ContextType::Admin);
    assert_eq!(ctx.description, "Administrative/setup context");
}

#[test]
fn ended_sessions_are_excluded() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.start_session("live", None, None).unwrap();
    store.start_session("gone", None, None).unwrap();
    store.end_session("gone").unwrap();

    let contexts = infer_all_active_contexts(&store);
    assert_eq!(contexts.len(), 1);
    assert_eq!(
        contexts[0].metadata.state_projection.session_id.as_deref(),
        Some("live")
    );
}

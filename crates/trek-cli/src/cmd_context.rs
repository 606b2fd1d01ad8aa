use std::path::Path;
use trek_context::{infer_context, summarize, ActiveContextMap, InferRequest};
use trek_core::Context;

use crate::workspace::{open_store, print_json};

/// `trek context`
pub fn context(
    repo_root: &Path,
    ticket: Option<&str>,
    project: Option<&str>,
    session: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(repo_root)?;
    let ctx = infer_context(
        &store,
        InferRequest {
            ticket_id: ticket,
            project_id: project,
            session_id: session,
        },
    );
    if json {
        print_json(&ctx)
    } else {
        print!("{}", render_context(&ctx));
        Ok(())
    }
}

/// `trek contexts`
pub fn contexts(repo_root: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(repo_root)?;
    let map = ActiveContextMap::collect(&store);
    if json {
        print_json(&map)
    } else {
        print!("{}", render_active(&map));
        Ok(())
    }
}

fn render_context(ctx: &Context) -> String {
    let mut out = format!("{}\n", summarize(Some(ctx)));
    out.push_str(&format!("  type:  {}\n", ctx.context_type));
    out.push_str(&format!(
        "  state: {}\n",
        ctx.metadata.state_projection.current_state
    ));
    if let Some(reason) = &ctx.metadata.reason {
        out.push_str(&format!("  reason: {reason}\n"));
    }
    if let Some(phase) = &ctx.metadata.review_phase {
        out.push_str(&format!("  review: {phase}\n"));
    }
    if let Some(level) = &ctx.metadata.readiness_level {
        out.push_str(&format!("  readiness: {level}\n"));
    }
    if let Some(sid) = &ctx.metadata.state_projection.session_id {
        out.push_str(&format!("  session: {sid}\n"));
    }
    out
}

fn render_active(map: &ActiveContextMap) -> String {
    let mut out = format!("{}\n", map.summary);
    for ctx in &map.contexts {
        out.push_str(&format!("  - {}\n", summarize(Some(ctx))));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trek_core::TicketStatus;
    use trek_store::{SqliteStore, TrekPaths};

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        crate::cmd_init::execute(tmp.path()).unwrap();
        tmp
    }

    #[test]
    fn render_review_context() {
        let tmp = workspace();
        let paths = TrekPaths::discover(tmp.path());
        let store = SqliteStore::open(&paths.db_path).unwrap();
        store
            .insert_ticket("t9", None, None, TicketStatus::HumanReview)
            .unwrap();
        let ctx = infer_context(
            &store,
            InferRequest {
                ticket_id: Some("t9"),
                ..Default::default()
            },
        );
        let text = render_context(&ctx);
        assert!(text.starts_with("Ticket t9 (human_review)"));
        assert!(text.contains("review: manual"));
        assert!(text.contains("state: reviewing"));
    }

    #[test]
    fn render_idle_workspace() {
        let tmp = workspace();
        let store = open_store(tmp.path()).unwrap();
        let map = ActiveContextMap::collect(&store);
        assert_eq!(render_active(&map), "idle: no active sessions\n");
    }

    #[test]
    fn context_requires_init() {
        let tmp = TempDir::new().unwrap();
        let err = context(tmp.path(), None, None, None, true).unwrap_err();
        assert!(err.to_string().contains("trek init"));
    }
}

use trek_core::{Context, ContextType};

/// Capability categories considered relevant to each context.
pub fn relevant_categories(context_type: ContextType) -> &'static [&'static str] {
    match context_type {
        ContextType::TicketWork => &["ticket_work", "code", "testing", "git", "general"],
        ContextType::Review => &["review", "code", "testing", "general"],
        ContextType::Planning => &["planning", "ticket_management", "general"],
        ContextType::Admin => &["admin", "settings", "general", "project_management"],
    }
}

/// Coarse category-level gate, usable without the capability registry.
/// Absent arguments are never relevant.
pub fn is_context_relevant(context: Option<&Context>, category: Option<&str>) -> bool {
    match (context, category) {
        (Some(ctx), Some(cat)) => relevant_categories(ctx.context_type).contains(&cat),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_work_categories() {
        let ctx = Context::explicit(ContextType::TicketWork);
        assert!(is_context_relevant(Some(&ctx), Some("git")));
        assert!(is_context_relevant(Some(&ctx), Some("general")));
        assert!(!is_context_relevant(Some(&ctx), Some("review")));
    }

    #[test]
    fn admin_includes_project_management() {
        let ctx = Context::explicit(ContextType::Admin);
        assert!(is_context_relevant(Some(&ctx), Some("project_management")));
        assert!(!is_context_relevant(Some(&ctx), Some("code")));
    }

    #[test]
    fn absent_arguments_are_irrelevant() {
        let ctx = Context::explicit(ContextType::Review);
        assert!(!is_context_relevant(None, Some("review")));
        assert!(!is_context_relevant(Some(&ctx), None));
        assert!(!is_context_relevant(None, None));
    }

    #[test]
    fn every_context_includes_general() {
        for ct in ContextType::ALL {
            assert!(relevant_categories(ct).contains(&"general"));
        }
    }
}

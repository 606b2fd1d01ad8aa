//! Static capability registry.
//!
//! Every capability the agent can invoke is described once here: which
//! category it belongs to, which contexts it is useful in, and how essential
//! it is. Adding a capability means appending a row to [`BUILTIN`]; the
//! lookup and counting logic never changes.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;
use thiserror::Error;

use crate::types::{ContextType, Priority};

/// Names of the two context-inspection capabilities. These are always
/// admitted so an agent can query and repair its own visibility.
pub const GET_CONTEXT_TOOLS: &str = "get_context_tools";
pub const CHECK_TOOL_VISIBILITY: &str = "check_tool_visibility";
pub const BOOTSTRAP_CAPABILITIES: [&str; 2] = [GET_CONTEXT_TOOLS, CHECK_TOOL_VISIBILITY];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("capability name must not be empty")]
    EmptyName,
    #[error("duplicate capability name: {0}")]
    DuplicateName(String),
    #[error("capability {0} declares no contexts")]
    NoContexts(String),
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub category: String,
    pub contexts: BTreeSet<ContextType>,
    pub priority: Priority,
    pub description: String,
}

impl CapabilityDescriptor {
    pub fn new(
        name: &str,
        category: &str,
        contexts: &[ContextType],
        priority: Priority,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            contexts: contexts.iter().copied().collect(),
            priority,
            description: description.to_string(),
        }
    }

    /// True when this capability qualifies for `context_type` at `max_priority`.
    pub fn admits(&self, context_type: ContextType, max_priority: Priority) -> bool {
        self.contexts.contains(&context_type) && self.priority <= max_priority
    }
}

/// Counts over the whole registry, one pass.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_count: usize,
    pub count_by_category: BTreeMap<String, usize>,
    pub count_by_context: BTreeMap<ContextType, usize>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<CapabilityDescriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry, rejecting empty names, duplicates, and context-less entries.
    pub fn new(descriptors: Vec<CapabilityDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            if d.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if d.contexts.is_empty() {
                return Err(RegistryError::NoContexts(d.name.clone()));
            }
            if index.insert(d.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateName(d.name.clone()));
            }
        }
        Ok(Self { descriptors, index })
    }

    /// The process-wide built-in catalog.
    pub fn builtin() -> &'static Registry {
        &BUILTIN_REGISTRY
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.descriptors.iter()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    /// Names admitted for `context_type` at or below `max_priority`, sorted.
    pub fn list_for_context(
        &self,
        context_type: ContextType,
        max_priority: Priority,
    ) -> BTreeSet<String> {
        self.descriptors
            .iter()
            .filter(|d| d.admits(context_type, max_priority))
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn statistics(&self) -> RegistryStats {
        let mut count_by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut count_by_context: BTreeMap<ContextType, usize> =
            ContextType::ALL.iter().map(|&c| (c, 0)).collect();
        for d in &self.descriptors {
            *count_by_category.entry(d.category.clone()).or_insert(0) += 1;
            for ctx in &d.contexts {
                *count_by_context.entry(*ctx).or_insert(0) += 1;
            }
        }
        RegistryStats {
            total_count: self.descriptors.len(),
            count_by_category,
            count_by_context,
        }
    }
}

// ── Built-in catalog ──

use ContextType::{Admin, Planning, Review, TicketWork};
use Priority::{Advanced, Critical, Important, Useful};

const ALL_CONTEXTS: &[ContextType] = &[TicketWork, Planning, Review, Admin];

type Row = (&'static str, &'static str, &'static [ContextType], Priority, &'static str);

const BUILTIN: &[Row] = &[
    // context inspection
    (GET_CONTEXT_TOOLS, "context", ALL_CONTEXTS, Critical, "List capabilities visible in the current context"),
    (CHECK_TOOL_VISIBILITY, "context", ALL_CONTEXTS, Critical, "Check whether a capability is visible in a context"),
    ("get_current_context", "context", ALL_CONTEXTS, Critical, "Infer the current work context from ticket and session state"),
    ("get_tool_metadata", "context", ALL_CONTEXTS, Important, "Describe a registered capability"),
    ("get_filter_stats", "context", &[Admin], Useful, "Report registry and filtering statistics"),
    ("set_filter_mode", "context", &[Admin], Useful, "Change the capability filter mode"),
    ("toggle_filtering", "context", &[Admin], Useful, "Enable or disable capability filtering"),
    // ticket management
    ("list_tickets", "ticket_management", ALL_CONTEXTS, Critical, "List tickets with optional status and project filters"),
    ("get_ticket", "ticket_management", ALL_CONTEXTS, Critical, "Fetch a single ticket with its details"),
    ("create_ticket", "ticket_management", &[Planning, Admin], Critical, "Create a new ticket"),
    ("move_ticket", "ticket_management", &[TicketWork, Planning, Review], Critical, "Move a ticket to another workflow status"),
    ("update_ticket", "ticket_management", &[Planning, TicketWork], Important, "Edit ticket title, description, or fields"),
    ("search_tickets", "ticket_management", ALL_CONTEXTS, Important, "Full-text search across tickets"),
    ("bulk_update_tickets", "ticket_management", &[Planning, Admin], Advanced, "Apply one change to many tickets"),
    ("delete_ticket", "ticket_management", &[Admin], Advanced, "Permanently delete a ticket"),
    // ticket work
    ("start_ticket_work", "ticket_work", &[Planning, TicketWork], Critical, "Claim a ready ticket and begin implementation"),
    ("complete_ticket_work", "ticket_work", &[TicketWork], Critical, "Finish implementation and hand off for review"),
    ("add_ticket_comment", "ticket_work", &[TicketWork, Review, Planning], Important, "Comment on a ticket"),
    ("get_ticket_comments", "ticket_work", &[TicketWork, Review], Important, "Read the comment thread of a ticket"),
    ("add_work_summary", "ticket_work", &[TicketWork], Important, "Record a summary of work performed"),
    ("link_files_to_ticket", "ticket_work", &[TicketWork], Useful, "Associate changed files with a ticket"),
    ("get_ticket_files", "ticket_work", &[TicketWork, Review], Useful, "List files linked to a ticket"),
    // code
    ("get_diff", "code", &[TicketWork, Review], Important, "Show the working diff for the current ticket"),
    ("get_file_context", "code", &[TicketWork, Review], Important, "Read surrounding code for a file location"),
    ("search_codebase", "code", &[TicketWork, Review], Useful, "Search the repository for a symbol or text"),
    // testing
    ("run_tests", "testing", &[TicketWork, Review], Important, "Run the project test suite"),
    ("get_test_results", "testing", &[TicketWork, Review], Useful, "Fetch results of the last test run"),
    // git
    ("create_branch", "git", &[TicketWork], Important, "Create a working branch for a ticket"),
    ("commit_changes", "git", &[TicketWork], Important, "Commit staged changes with a ticket reference"),
    ("get_git_status", "git", &[TicketWork], Useful, "Show repository status"),
    ("create_pull_request", "git", &[TicketWork, Review], Useful, "Open a pull request for a ticket branch"),
    // review
    ("submit_review", "review", &[Review], Critical, "Submit a review verdict for a ticket"),
    ("approve_ticket", "review", &[Review], Critical, "Approve a reviewed ticket"),
    ("request_changes", "review", &[Review], Critical, "Send a ticket back with requested changes"),
    ("add_review_comment", "review", &[Review], Important, "Leave a review comment on a change"),
    ("get_review_history", "review", &[Review], Useful, "List previous review rounds"),
    // planning
    ("create_epic", "planning", &[Planning], Important, "Create an epic grouping related tickets"),
    ("list_epics", "planning", &[Planning, Admin], Important, "List epics in a project"),
    ("set_ticket_priority", "planning", &[Planning], Important, "Set the priority of a ticket"),
    ("estimate_ticket", "planning", &[Planning], Useful, "Record an effort estimate"),
    ("add_ticket_dependency", "planning", &[Planning], Useful, "Declare that a ticket blocks another"),
    ("get_ticket_dependencies", "planning", &[Planning, TicketWork], Advanced, "Show the dependency graph of a ticket"),
    // projects
    ("list_projects", "project_management", &[Admin, Planning], Critical, "List projects"),
    ("create_project", "project_management", &[Admin], Important, "Create a project"),
    ("get_project", "project_management", &[Admin, Planning], Important, "Fetch project details"),
    ("archive_project", "project_management", &[Admin], Advanced, "Archive a project and its tickets"),
    // administration
    ("get_system_health", "admin", &[Admin], Useful, "Report store and service health"),
    ("backup_database", "admin", &[Admin], Advanced, "Write a backup of the tracker database"),
    ("get_usage_analytics", "admin", &[Admin], Advanced, "Summarize capability usage over time"),
    ("get_settings", "settings", &[Admin], Useful, "Read tracker settings"),
    ("update_settings", "settings", &[Admin], Advanced, "Change tracker settings"),
    // general
    ("get_help", "general", ALL_CONTEXTS, Important, "Explain the ticket workflow and available capabilities"),
    ("get_workflow_guide", "general", ALL_CONTEXTS, Useful, "Describe what to do next in the current phase"),
    ("export_ticket_history", "general", ALL_CONTEXTS, Advanced, "Export the full event history of a ticket"),
];

static BUILTIN_REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let descriptors = BUILTIN
        .iter()
        .map(|(name, category, contexts, priority, description)| {
            CapabilityDescriptor::new(name, category, contexts, *priority, description)
        })
        .collect();
    // The table is compile-time data; a duplicate or empty row is a programming error.
    Registry::new(descriptors).expect("built-in capability table is valid")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn small_registry() -> Registry {
        Registry::new(vec![
            CapabilityDescriptor::new("a", "x", &[TicketWork, Review], Critical, ""),
            CapabilityDescriptor::new("b", "x", &[TicketWork], Useful, ""),
            CapabilityDescriptor::new("c", "y", &[Admin], Advanced, ""),
        ])
        .unwrap()
    }

    #[test]
    fn builtin_registry_loads() {
        let reg = Registry::builtin();
        assert!(reg.len() > 40);
        for name in BOOTSTRAP_CAPABILITIES {
            assert!(reg.contains(name), "missing bootstrap capability {name}");
        }
    }

    #[test]
    fn builtin_descriptors_have_contexts() {
        assert!(Registry::builtin().iter().all(|d| !d.contexts.is_empty()));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Registry::new(vec![
            CapabilityDescriptor::new("a", "x", &[Admin], Critical, ""),
            CapabilityDescriptor::new("a", "y", &[Review], Critical, ""),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("a".into()));
    }

    #[test]
    fn rejects_empty_contexts() {
        let err = Registry::new(vec![CapabilityDescriptor::new("a", "x", &[], Critical, "")])
            .unwrap_err();
        assert_eq!(err, RegistryError::NoContexts("a".into()));
    }

    #[test]
    fn rejects_empty_name() {
        let err = Registry::new(vec![CapabilityDescriptor::new("", "x", &[Admin], Critical, "")])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn list_for_context_respects_priority() {
        let reg = small_registry();
        let strict: Vec<_> = reg.list_for_context(TicketWork, Critical).into_iter().collect();
        assert_eq!(strict, vec!["a"]);
        let permissive: Vec<_> = reg.list_for_context(TicketWork, Useful).into_iter().collect();
        assert_eq!(permissive, vec!["a", "b"]);
        assert!(reg.list_for_context(Planning, Advanced).is_empty());
    }

    #[test]
    fn statistics_counts_each_context() {
        let stats = small_registry().statistics();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.count_by_category["x"], 2);
        assert_eq!(stats.count_by_category["y"], 1);
        assert_eq!(stats.count_by_context[&TicketWork], 2);
        assert_eq!(stats.count_by_context[&Review], 1);
        assert_eq!(stats.count_by_context[&Admin], 1);
        assert_eq!(stats.count_by_context[&Planning], 0);
    }

    #[test]
    fn get_unknown_is_none() {
        assert!(Registry::builtin().get("no_such_tool").is_none());
        let d = Registry::builtin().get("list_tickets").unwrap();
        assert_eq!(d.priority, Critical);
        assert!(d.contexts.contains(&TicketWork));
    }

    #[test]
    fn descriptor_serializes_priority_as_number() {
        let d = Registry::builtin().get("link_files_to_ticket").unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["priority"], 3);
        assert_eq!(json["contexts"], serde_json::json!(["ticket_work"]));
    }
}

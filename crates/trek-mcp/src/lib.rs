use std::path::Path;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use trek_context::{infer_context, summarize, InferRequest};
use trek_core::{ContextType, Registry};
use trek_filter::{FilterEngine, FilterRequest};
use trek_store::{SqliteStore, TrekConfig, TrekPaths};

// --- Tool parameter structs ---

#[derive(Debug, Deserialize, JsonSchema)]
struct ContextToolsParams {
    /// Preview a context instead of inferring it: ticket_work, planning, review, or admin
    context_type: Option<String>,
    /// Ticket to infer the context from
    ticket_id: Option<String>,
    /// Agent session to infer the context from (its ticket wins over ticket_id)
    session_id: Option<String>,
    /// Also list hidden capabilities, for diagnostics (default: false)
    shadow_mode: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ToolNameParams {
    /// Capability name (e.g. "list_tickets")
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct VisibilityParams {
    /// Capability name to check
    name: String,
    /// Preview a context instead of inferring it
    context_type: Option<String>,
    ticket_id: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ModeParams {
    /// One of: strict, default, permissive, full
    mode: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ToggleParams {
    /// true to filter capabilities by context, false to expose everything
    enabled: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CurrentContextParams {
    ticket_id: Option<String>,
    project_id: Option<String>,
    session_id: Option<String>,
}

/// Structured error payload returned as tool content.
#[derive(Debug, Serialize)]
struct ToolError<'a> {
    error: &'a str,
    message: String,
}

// --- MCP Server ---

/// MCP server over one process-lifetime filter engine.
#[derive(Clone)]
pub struct TrekServer {
    engine: Arc<FilterEngine<SqliteStore>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TrekServer {
    pub fn new(engine: Arc<FilterEngine<SqliteStore>>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    /// List the capabilities visible in the current or a previewed context
    #[tool(
        description = "List the capabilities visible in the current context (inferred from ticket/session) or in an explicitly previewed context. Shadow mode also lists hidden capabilities."
    )]
    async fn get_context_tools(
        &self,
        Parameters(params): Parameters<ContextToolsParams>,
    ) -> Result<CallToolResult, McpError> {
        let context_type = match parse_context_type(params.context_type.as_deref()) {
            Ok(ct) => ct,
            Err(result) => return Ok(result),
        };
        let result = self.engine.filter(FilterRequest {
            context_type,
            ticket_id: params.ticket_id.as_deref(),
            session_id: params.session_id.as_deref(),
            shadow_mode: params.shadow_mode.unwrap_or(false),
        });
        json_result(&result)
    }

    /// Describe one registered capability
    #[tool(description = "Describe one registered capability: category, contexts, priority")]
    async fn get_tool_metadata(
        &self,
        Parameters(params): Parameters<ToolNameParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.engine.registry().get(&params.name) {
            Some(descriptor) => json_result(descriptor),
            None => Ok(not_found(&params.name)),
        }
    }

    /// Registry and filtering statistics
    #[tool(description = "Report registry counts and per-context filtering statistics")]
    async fn get_filter_stats(&self) -> Result<CallToolResult, McpError> {
        let payload = serde_json::json!({
            "filter": self.engine.statistics(),
            "registry": self.engine.registry().statistics(),
            "report": self.engine.report(),
        });
        json_result(&payload)
    }

    /// Change the filter mode for the rest of this process
    #[tool(description = "Change the capability filter mode: strict, default, permissive, or full")]
    async fn set_filter_mode(
        &self,
        Parameters(params): Parameters<ModeParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.engine.set_mode(&params.mode) {
            Ok(_) => json_result(&self.engine.policy()),
            Err(e) => Ok(tool_error("invalid_configuration", e.to_string())),
        }
    }

    /// Enable or disable filtering for the rest of this process
    #[tool(description = "Enable or disable capability filtering; disabled exposes every capability")]
    async fn toggle_filtering(
        &self,
        Parameters(params): Parameters<ToggleParams>,
    ) -> Result<CallToolResult, McpError> {
        self.engine.set_enabled(params.enabled);
        json_result(&self.engine.policy())
    }

    /// Check whether one capability is visible
    #[tool(description = "Check whether one capability is visible in the current or a previewed context")]
    async fn check_tool_visibility(
        &self,
        Parameters(params): Parameters<VisibilityParams>,
    ) -> Result<CallToolResult, McpError> {
        if !self.engine.registry().contains(&params.name) {
            return Ok(not_found(&params.name));
        }
        let context_type = match parse_context_type(params.context_type.as_deref()) {
            Ok(ct) => ct,
            Err(result) => return Ok(result),
        };
        let visible = self.engine.is_visible(
            &params.name,
            FilterRequest {
                context_type,
                ticket_id: params.ticket_id.as_deref(),
                session_id: params.session_id.as_deref(),
                shadow_mode: false,
            },
        );
        let policy = self.engine.policy();
        json_result(&serde_json::json!({
            "name": params.name,
            "visible": visible,
            "enabled": policy.enabled,
            "mode": policy.mode,
        }))
    }

    /// Infer the current work context
    #[tool(description = "Infer the current work context (ticket_work, planning, review, admin) from ticket and session state")]
    async fn get_current_context(
        &self,
        Parameters(params): Parameters<CurrentContextParams>,
    ) -> Result<CallToolResult, McpError> {
        let ctx = infer_context(
            self.engine.store(),
            InferRequest {
                ticket_id: params.ticket_id.as_deref(),
                project_id: params.project_id.as_deref(),
                session_id: params.session_id.as_deref(),
            },
        );
        json_result(&serde_json::json!({
            "summary": summarize(Some(&ctx)),
            "context": ctx,
        }))
    }
}

#[tool_handler]
impl ServerHandler for TrekServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "trek capability server: infer the agent's work context and list the capabilities relevant to it"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn parse_context_type(raw: Option<&str>) -> Result<Option<ContextType>, CallToolResult> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: trek_core::ParseError| tool_error("invalid_argument", e.to_string())),
    }
}

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn tool_error(kind: &str, message: String) -> CallToolResult {
    let payload = ToolError {
        error: kind,
        message,
    };
    let json = serde_json::to_string_pretty(&payload)
        .unwrap_or_else(|_| format!("{{\"error\":\"{kind}\"}}"));
    CallToolResult::error(vec![Content::text(json)])
}

fn not_found(name: &str) -> CallToolResult {
    tool_error("not_found", format!("no capability named {name:?}"))
}

/// Start the MCP server on stdio transport.
pub async fn serve(repo_root: &Path) -> anyhow::Result<()> {
    let paths = TrekPaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("not a trek workspace (run `trek init` first)");
    }
    let config = TrekConfig::load(&paths.config_json)?;
    let store = SqliteStore::open(&paths.db_path)?;
    let engine = Arc::new(FilterEngine::from_config(store, &config));
    info!(
        enabled = config.capability_filtering,
        capabilities = Registry::builtin().len(),
        "starting trek MCP server"
    );

    let server = TrekServer::new(engine);
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trek_core::TicketStatus;
    use trek_filter::FilterOptions;

    fn server_with(store: SqliteStore) -> TrekServer {
        let engine = FilterEngine::new(store, FilterOptions::default()).unwrap();
        TrekServer::new(Arc::new(engine))
    }

    fn server() -> TrekServer {
        server_with(SqliteStore::open_in_memory().unwrap())
    }

    fn text(result: &CallToolResult) -> serde_json::Value {
        let raw = result.content[0].raw.as_text().unwrap().text.as_str();
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn server_info_has_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn context_tools_for_ticket() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_ticket("t1", None, None, TicketStatus::InProgress)
            .unwrap();
        let server = server_with(store);

        let result = server
            .get_context_tools(Parameters(ContextToolsParams {
                context_type: None,
                ticket_id: Some("t1".into()),
                session_id: None,
                shadow_mode: Some(true),
            }))
            .await
            .unwrap();
        let json = text(&result);
        assert_eq!(json["context_type"], "ticket_work");
        let visible: Vec<&str> = json["visible_capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(visible.contains(&"list_tickets"));
        assert!(json["hidden_capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v == "link_files_to_ticket"));
    }

    #[tokio::test]
    async fn context_tools_rejects_unknown_context() {
        let result = server()
            .get_context_tools(Parameters(ContextToolsParams {
                context_type: Some("deploy".into()),
                ticket_id: None,
                session_id: None,
                shadow_mode: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result)["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn metadata_found_and_not_found() {
        let server = server();
        let found = server
            .get_tool_metadata(Parameters(ToolNameParams {
                name: "link_files_to_ticket".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text(&found)["priority"], 3);

        let missing = server
            .get_tool_metadata(Parameters(ToolNameParams {
                name: "nope".into(),
            }))
            .await
            .unwrap();
        assert_eq!(missing.is_error, Some(true));
        assert_eq!(text(&missing)["error"], "not_found");
    }

    #[tokio::test]
    async fn set_mode_valid_and_invalid() {
        let server = server();
        let ok = server
            .set_filter_mode(Parameters(ModeParams {
                mode: "strict".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text(&ok)["mode"], "strict");
        assert_eq!(text(&ok)["max_priority"], 1);

        let bad = server
            .set_filter_mode(Parameters(ModeParams {
                mode: "bogus".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text(&bad)["error"], "invalid_configuration");
        assert_eq!(server.engine.policy().mode.as_str(), "strict");
    }

    #[tokio::test]
    async fn toggle_and_check_visibility() {
        let server = server();
        let check = |name: &str| VisibilityParams {
            name: name.to_string(),
            context_type: Some("planning".into()),
            ticket_id: None,
            session_id: None,
        };

        let hidden = server
            .check_tool_visibility(Parameters(check("backup_database")))
            .await
            .unwrap();
        assert_eq!(text(&hidden)["visible"], false);

        server
            .toggle_filtering(Parameters(ToggleParams { enabled: false }))
            .await
            .unwrap();
        let shown = server
            .check_tool_visibility(Parameters(check("backup_database")))
            .await
            .unwrap();
        assert_eq!(text(&shown)["visible"], true);

        let unknown = server
            .check_tool_visibility(Parameters(check("not_a_tool")))
            .await
            .unwrap();
        assert_eq!(text(&unknown)["error"], "not_found");
    }

    #[tokio::test]
    async fn filter_stats_payload() {
        let result = server().get_filter_stats().await.unwrap();
        let json = text(&result);
        assert_eq!(json["filter"]["mode"], "default");
        assert!(json["registry"]["total_count"].as_u64().unwrap() > 40);
        assert!(json["filter"]["by_context"]["review"]["visible"].is_number());
        assert!(json["report"]["hints"].is_array());
    }

    #[tokio::test]
    async fn current_context_summary() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_project("p1", "Core").unwrap();
        store
            .insert_ticket("t2", Some("p1"), None, TicketStatus::AiReview)
            .unwrap();
        let server = server_with(store);
        let result = server
            .get_current_context(Parameters(CurrentContextParams {
                ticket_id: Some("t2".into()),
                project_id: None,
                session_id: None,
            }))
            .await
            .unwrap();
        let json = text(&result);
        assert_eq!(json["context"]["type"], "review");
        assert_eq!(json["context"]["metadata"]["review_phase"], "automated");
        assert_eq!(json["summary"], "Ticket t2 (ai_review) in project p1");
    }

    #[tokio::test]
    async fn serve_requires_workspace() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = serve(tmp.path()).await.unwrap_err();
        assert!(err.to_string().contains("trek init"));
    }
}

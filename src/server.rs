//! MCP server exposing the search index tools over stdio.

use crate::tools::inspect_entry::{InspectEntryRequest, handle_inspect_entry};
use crate::tools::list_pages::{ListPagesRequest, handle_list_pages};
use crate::tools::load_index::{LoadIndexRequest, handle_load_index};
use crate::tools::search::{SearchRequest, handle_search};
use crate::worker::IndexState;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for documentation search indexes.
#[derive(Clone)]
pub struct IndexServer {
    /// Shared index state (sources, loaded indexes, in-flight loads)
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for IndexServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl IndexServer {
    pub fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the shared IndexState.
    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Full-text search over a documentation search index. Matches entry titles, text and page names with stemming, ranks symbols whose name matches the query first. Filter by category (page, section, type, method) or page title.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Show the full record for a documentation entry. Accepts a location ('api/public/#Pkg.Name'), a full title ('Pkg.Name') or a bare symbol name ('Name'). Suggests close matches when nothing is found.",
        input_schema = inline_schema_for_type::<InspectEntryRequest>()
    )]
    async fn inspect_entry(
        &self,
        Parameters(request): Parameters<InspectEntryRequest>,
    ) -> std::result::Result<String, String> {
        handle_inspect_entry(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Summarize a search index: entry counts per category, the pages it covers, and any structural issues such as API entries without documentation text.",
        input_schema = inline_schema_for_type::<ListPagesRequest>()
    )]
    async fn list_pages(
        &self,
        Parameters(request): Parameters<ListPagesRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_pages(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Register a search_index.js file, or every search_index.js under a directory, and load it. Reports entry counts once loaded.",
        input_schema = inline_schema_for_type::<LoadIndexRequest>()
    )]
    async fn load_index(
        &self,
        Parameters(request): Parameters<LoadIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_load_index(&self.state, request)
            .await
            .map_err(|e| format!("Failed to load index: {}", e))
    }
}

#[tool_handler]
impl ServerHandler for IndexServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "docsearch-mcp: search generated documentation sites through their search_index.js. \
             Indexes configured at startup are available by name; the first one is the default. \
             Use load_index to add a site, search to find entries, inspect_entry to read one, \
             and list_pages for an overview."
                .to_string(),
        );
        info
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this sets `inline_subschemas = true`
/// so enums such as `category` and `detail_level` are emitted inline instead of
/// as `$ref` definitions.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();

    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => Arc::new(object),
        Ok(_) | Err(_) => {
            tracing::error!("Schema serialization produced a non-object value");
            Arc::new(JsonObject::new())
        }
    }
}

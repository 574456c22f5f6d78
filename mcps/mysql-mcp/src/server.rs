//! MCP Server implementation for MySQL
//!
//! Routes the four protocol requests (list/read resources, list/call tools)
//! to the handlers. The database pool is injected at construction.

use std::sync::Arc;

use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, IntoMcpError,
    McpError, ReadResourceResult, Resource, ResultExt, Tool,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParam, ListResourcesResult, ListToolsResult, PaginatedRequestParam,
        ReadResourceRequestParam, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_router, RoleServer,
};
use serde_json::Value;

use crate::db::Database;
use crate::handlers;
use crate::params::QueryParams;
use crate::types::ServerError;
use crate::uri::ResourceBase;

/// Name of the only tool
pub const QUERY_TOOL: &str = "query";

/// The MySQL MCP Server
#[derive(Clone)]
pub struct MysqlMcpServer {
    db: Arc<dyn Database>,
    resource_base: ResourceBase,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl MysqlMcpServer {
    pub fn new(db: Arc<dyn Database>, resource_base: ResourceBase) -> Self {
        Self {
            db,
            resource_base,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Run a read-only SQL query")]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::query(self.db.as_ref(), params).await
    }
}

impl MysqlMcpServer {
    /// Route a tool call; unknown names fail before the pool is touched
    async fn dispatch_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        match name {
            QUERY_TOOL => {
                let params: QueryParams = serde_json::from_value(arguments)
                    .map_err(|e| ServerError::InvalidArguments(e.to_string()))
                    .to_mcp_err()?;
                self.query(Parameters(params)).await
            }
            other => {
                tracing::warn!("Unknown tool requested: {}", other);
                Err(ServerError::UnknownTool(other.to_string()).into_mcp_error())
            }
        }
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

impl rmcp::ServerHandler for MysqlMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "MySQL MCP server. Each table's column names and types are available \
                 as a `<table>/schema` resource. Use the query tool to run SQL; every \
                 query runs in a read-only transaction that is rolled back."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = handlers::list_resources(self.db.as_ref(), &self.resource_base).await?;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        handlers::read_resource(self.db.as_ref(), &request.uri).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        self.dispatch_tool(&request.name, arguments).await
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for MysqlMcpServer {
    fn server_name(&self) -> &str {
        "mysql"
    }

    fn server_description(&self) -> Option<&str> {
        Some(
            "MySQL MCP Server - table schemas as resources and a read-only \
             SQL query tool.",
        )
    }

    fn server_version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        if name != QUERY_TOOL {
            return Err(EmbeddableError::ToolNotFound(name.to_string()));
        }
        self.dispatch_tool(name, params).await.map_err(Into::into)
    }

    async fn list_resources(&self) -> EmbeddableResult<Vec<Resource>> {
        handlers::list_resources(self.db.as_ref(), &self.resource_base)
            .await
            .map_err(Into::into)
    }

    async fn read_resource(&self, uri: &str) -> EmbeddableResult<ReadResourceResult> {
        handlers::read_resource(self.db.as_ref(), uri)
            .await
            .map_err(Into::into)
    }
}

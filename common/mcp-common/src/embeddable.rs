//! In-process execution of MCP servers
//!
//! [`EmbeddableMcp`] lets a host drive a server's tools and resources
//! directly, without a subprocess or stdio framing. Servers route both the
//! rmcp handler and this trait through the same dispatch code, so behavior
//! is identical either way.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//!
//! let tools = server.list_tools();
//! let resources = server.list_resources().await?;
//! let result = server.call_tool("query", serde_json::json!({ "sql": "SELECT 1" })).await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, ReadResourceResult, Resource, Tool};
use serde_json::Value;

/// Error type for embedded MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// Tool was not found in the server
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Resource URI is not served by this server
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Error reported by the server's handler, code preserved
    #[error("mcp error: {}", .0.message)]
    McpError(rmcp::ErrorData),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err)
    }
}

/// Result type for embedded MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server that can be driven in-process
///
/// Implementations must be `Send + Sync`; hosts call into them from many
/// tasks at once.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Server name, matching the name used in MCP configuration files
    fn server_name(&self) -> &str;

    /// All tools with their input schemas
    fn list_tools(&self) -> Vec<Tool>;

    /// Execute a tool by name with a JSON object of arguments
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    /// All resources currently advertised by the server
    async fn list_resources(&self) -> EmbeddableResult<Vec<Resource>> {
        Ok(Vec::new())
    }

    /// Read one resource by URI
    async fn read_resource(&self, uri: &str) -> EmbeddableResult<ReadResourceResult> {
        Err(EmbeddableError::ResourceNotFound(uri.to_string()))
    }

    fn server_description(&self) -> Option<&str> {
        None
    }

    fn server_version(&self) -> Option<&str> {
        None
    }
}

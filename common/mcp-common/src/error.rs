//! Error helpers for MCP handlers
//!
//! Every failure a handler reports travels to the client as an
//! [`McpError`] (JSON-RPC error object). These helpers keep the
//! code/message pairing consistent across servers.

use rmcp::{model::ErrorCode, ErrorData as McpError};

/// Type alias for MCP handler results
pub type McpResult<T> = Result<T, McpError>;

/// Conversion of an arbitrary error into an MCP error
///
/// Implement this for a server's own error enum to pick the JSON-RPC code
/// per variant, then use [`ResultExt::to_mcp_err`] at the handler boundary.
pub trait IntoMcpError {
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

/// Extension for `Result` to convert the error side into an [`McpError`]
///
/// ```rust,ignore
/// use mcp_common::ResultExt;
///
/// let rows = executor::run_read_only(db, &sql).await.to_mcp_err()?;
/// ```
pub trait ResultExt<T> {
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(|e| e.into_mcp_error())
    }
}

/// Internal error (-32603): the request was valid but the backend failed
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

/// Invalid params error (-32602): the request arguments were rejected
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

/// Method-not-found error (-32601) for a tool name the server does not route
pub fn unknown_tool(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Unknown tool: {}", name),
        None,
    )
}

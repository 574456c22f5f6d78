//! MCP Common - shared plumbing for MCP servers
//!
//! - **Startup**: [`init_tracing`] and [`serve_stdio`]
//! - **Results**: [`json_success`] for tools, [`json_resource`] for resources
//! - **Errors**: [`IntoMcpError`] / [`ResultExt`] and JSON-RPC error constructors
//! - **Embedding**: [`EmbeddableMcp`] for in-process execution
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     mcp_common::init_tracing("my_mcp")?;
//!     mcp_common::serve_stdio(MyServer::new(), "my_mcp").await
//! }
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::{
    internal_error, invalid_params, unknown_tool, IntoMcpError, McpResult, ResultExt,
};
pub use init::{init_tracing, serve_stdio};
pub use result::{json_resource, json_success, JSON_MIME_TYPE};

pub use rmcp::{
    model::{CallToolResult, Content, ReadResourceResult, Resource, Tool},
    ErrorData as McpError,
};

pub use async_trait::async_trait;

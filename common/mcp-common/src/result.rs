//! Result helpers for MCP responses
//!
//! Builders for the two structured payloads servers return most: a tool
//! result carrying JSON text, and a resource read carrying JSON text.

use rmcp::{
    model::{CallToolResult, Content, ReadResourceResult, ResourceContents},
    ErrorData as McpError,
};
use serde::Serialize;

use crate::error::ResultExt;

/// MIME type attached to JSON resource payloads
pub const JSON_MIME_TYPE: &str = "application/json";

fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(data).to_mcp_err()
}

/// Successful tool result with one pretty-printed JSON text item
///
/// The result carries `isError: false`.
pub fn json_success<T: Serialize + ?Sized>(data: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(to_pretty_json(data)?)]))
}

/// Resource read result with one pretty-printed JSON text item for `uri`
pub fn json_resource<T: Serialize + ?Sized>(
    uri: impl Into<String>,
    data: &T,
) -> Result<ReadResourceResult, McpError> {
    let mut contents = ResourceContents::text(to_pretty_json(data)?, uri);
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(JSON_MIME_TYPE.to_string());
    }
    Ok(ReadResourceResult {
        contents: vec![contents],
    })
}

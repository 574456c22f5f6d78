//! Protocol-facing handlers
//!
//! Each handler runs a catalog or executor operation and turns the outcome
//! into an MCP result, or an MCP error carrying the underlying message.

use mcp_common::{
    json_resource, json_success, CallToolResult, McpError, ReadResourceResult, Resource,
    ResultExt, JSON_MIME_TYPE,
};
use rmcp::model::{AnnotateAble, RawResource};

use crate::catalog;
use crate::db::Database;
use crate::executor;
use crate::params::QueryParams;
use crate::types::ResourceDescriptor;
use crate::uri::ResourceBase;

pub async fn list_resources(
    db: &dyn Database,
    base: &ResourceBase,
) -> Result<Vec<Resource>, McpError> {
    let descriptors = catalog::list_resources(db, base)
        .await
        .inspect_err(|e| tracing::warn!("Listing tables failed: {}", e))
        .to_mcp_err()?;
    Ok(descriptors.into_iter().map(to_resource).collect())
}

fn to_resource(descriptor: ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(descriptor.uri, descriptor.name);
    raw.mime_type = Some(JSON_MIME_TYPE.to_string());
    raw.no_annotation()
}

pub async fn read_resource(db: &dyn Database, uri: &str) -> Result<ReadResourceResult, McpError> {
    let columns = catalog::read_schema(db, uri)
        .await
        .inspect_err(|e| tracing::warn!(uri, "Reading schema failed: {}", e))
        .to_mcp_err()?;
    json_resource(uri, &columns)
}

pub async fn query(db: &dyn Database, params: QueryParams) -> Result<CallToolResult, McpError> {
    let rows = executor::run_read_only(db, &params.sql)
        .await
        .inspect_err(|e| tracing::warn!("Query failed: {}", e))
        .to_mcp_err()?;
    tracing::info!("Query returned {} row(s)", rows.len());
    json_success(&rows)
}

//! Descriptors and error types for the MySQL MCP server

use mcp_common::{internal_error, invalid_params, unknown_tool, IntoMcpError, McpError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbError;
use crate::uri::UriError;

// ============================================================================
// Descriptors
// ============================================================================

/// One table's schema resource, as advertised by `resources/list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub table: String,
}

impl ResourceDescriptor {
    pub fn new(table: impl Into<String>, uri: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            uri: uri.into(),
            name: format!("\"{}\" database schema", table),
            table,
        }
    }
}

/// Column name and declared data type from `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures surfaced to the MCP client
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid resource URI: {0}")]
    InvalidResourceUri(#[from] UriError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl IntoMcpError for ServerError {
    fn into_mcp_error(self) -> McpError {
        match self {
            ServerError::InvalidResourceUri(_) | ServerError::InvalidArguments(_) => {
                invalid_params(self.to_string())
            }
            ServerError::UnknownTool(name) => unknown_tool(&name),
            ServerError::Database(e) => e.into_mcp_error(),
        }
    }
}

impl IntoMcpError for DbError {
    fn into_mcp_error(self) -> McpError {
        match self {
            DbError::MultipleStatements(_) => invalid_params(self.to_string()),
            _ => internal_error(self.to_string()),
        }
    }
}

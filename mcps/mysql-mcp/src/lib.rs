//! MySQL MCP Library
//!
//! Exposes each table of a MySQL database as a schema resource and offers a
//! single `query` tool whose SQL always runs in a read-only transaction that
//! is rolled back.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mysql_mcp::{db::mysql::MySqlDatabase, config::PoolConfig, uri::ResourceBase, MysqlMcpServer};
//!
//! let url = "mysql://app@localhost:3306/shop";
//! let db = MySqlDatabase::connect_lazy(url, &PoolConfig::default())?;
//! let server = MysqlMcpServer::new(Arc::new(db), ResourceBase::from_connection_url(url)?);
//! // Serve via stdio, or embed through `EmbeddableMcp`
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod executor;
pub mod handlers;
pub mod params;
pub mod server;
pub mod types;
pub mod uri;

#[cfg(test)]
mod testing;

// Re-export main server type
pub use server::MysqlMcpServer;

// Re-export parameter types for direct API usage
pub use params::QueryParams;

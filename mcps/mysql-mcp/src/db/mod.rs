//! Database capability shared by all handlers
//!
//! Handlers never touch a driver directly. They borrow connections through
//! [`Database`], which the binary backs with a sqlx MySQL pool
//! ([`mysql::MySqlDatabase`]) and tests back with an in-memory fake.

pub mod mysql;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::ColumnDescriptor;

/// One result row: field name to value, in column order
pub type Row = Map<String, Value>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Driver(#[from] sqlx::Error),

    #[error("failed to decode column `{column}`: {message}")]
    Decode { column: String, message: String },

    #[error("Only one SQL statement can be run per query, found {0}")]
    MultipleStatements(usize),

    /// Statement rejected by the engine, carrying its message
    #[error("{0}")]
    Rejected(String),
}

/// The pool: hands out exclusive connections and answers catalog lookups
#[async_trait]
pub trait Database: Send + Sync {
    /// Borrow one connection for exclusive use
    async fn acquire(&self) -> Result<Box<dyn Connection>, DbError>;

    /// Base table names in the connection's current database
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// Columns of `table` in the current database, in ordinal order
    ///
    /// A table that does not exist has no columns; this is not an error.
    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError>;
}

/// A connection borrowed from a [`Database`]
#[async_trait]
pub trait Connection: Send {
    /// Run a statement whose result set, if any, is discarded
    async fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    /// Run a statement and collect every row it returns
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Hand the connection back to the pool
    fn release(self: Box<Self>);

    /// Close the connection instead of returning it to the pool
    fn discard(self: Box<Self>);
}

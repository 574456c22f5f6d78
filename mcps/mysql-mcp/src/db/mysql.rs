//! sqlx-backed MySQL pool
//!
//! Transaction control statements go over the text protocol (`COM_QUERY`).
//! Caller SQL goes through a one-shot prepared statement instead: MySQL
//! prepares exactly one statement at a time, so `;`-chained input is
//! refused by the server rather than run piecemeal. Values then arrive in
//! the binary protocol and [`ValueKind`] picks the decoding per column type.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use sqlx::{
    error::BoxDynError,
    mysql::{types::MySqlTime, MySql, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlValueRef},
    pool::PoolConnection,
    Column, Decode, Row as _, TypeInfo, ValueRef,
};

use super::{Connection, Database, DbError, Row};
use crate::config::PoolConfig;
use crate::types::ColumnDescriptor;

const LIST_TABLES_SQL: &str = "SELECT CAST(table_name AS CHAR) \
     FROM information_schema.tables \
     WHERE table_schema = DATABASE() \
     ORDER BY table_name";

const TABLE_COLUMNS_SQL: &str = "SELECT CAST(column_name AS CHAR), CAST(data_type AS CHAR) \
     FROM information_schema.columns \
     WHERE table_name = ? AND table_schema = DATABASE() \
     ORDER BY ordinal_position";

/// Process-wide MySQL connection pool
#[derive(Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    /// Create the pool without opening any connection yet
    ///
    /// Only the URL syntax is checked here; connection failures surface on
    /// the first request that needs the database.
    pub fn connect_lazy(database_url: &str, config: &PoolConfig) -> Result<Self, DbError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(config.idle_timeout_secs.map(Duration::from_secs))
            .connect_lazy(database_url)?;

        tracing::debug!(
            max_connections = config.max_connections,
            "Created lazy MySQL pool"
        );

        Ok(Self { pool })
    }

    /// Wrap a pool built elsewhere
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DbError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PooledConnection(conn)))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let tables = sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(tables)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError> {
        let rows: Vec<(String, String)> = sqlx::query_as(TABLE_COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnDescriptor::new(name, data_type))
            .collect())
    }
}

struct PooledConnection(PoolConnection<MySql>);

#[async_trait]
impl Connection for PooledConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        sqlx::Executor::execute(&mut *self.0, sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *self.0)
            .await?;
        rows.iter().map(row_to_json).collect()
    }

    fn release(self: Box<Self>) {
        // Dropping a PoolConnection returns it to its pool.
        drop(self.0);
    }

    fn discard(self: Box<Self>) {
        drop(self.0.detach());
    }
}

fn row_to_json(row: &MySqlRow) -> Result<Row, DbError> {
    let mut out = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let raw = row.try_get_raw(column.ordinal())?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let kind = ValueKind::of(column.type_info().name());
            kind.decode(raw).map_err(|e| DbError::Decode {
                column: column.name().to_string(),
                message: e.to_string(),
            })?
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// How values of one column type become JSON
///
/// Integers and floats become numbers, temporal values their usual text
/// form, JSON columns parsed JSON. DECIMAL and everything textual stay
/// strings so no precision is lost. Binary data is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Signed,
    Unsigned,
    Float,
    Double,
    Date,
    DateTime,
    Time,
    Json,
    Binary,
    Text,
}

impl ValueKind {
    /// Classify a column by its sqlx type name (`"INT"`, `"BIGINT UNSIGNED"`, ...)
    pub fn of(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                Self::Signed
            }
            name if name.ends_with(" UNSIGNED") => Self::Unsigned,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DATE" => Self::Date,
            "DATETIME" | "TIMESTAMP" => Self::DateTime,
            "TIME" => Self::Time,
            "JSON" => Self::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => Self::Binary,
            _ => Self::Text,
        }
    }

    fn decode(self, raw: MySqlValueRef<'_>) -> Result<Value, BoxDynError> {
        Ok(match self {
            Self::Signed => Value::from(<i64 as Decode<'_, MySql>>::decode(raw)?),
            Self::Unsigned => Value::from(<u64 as Decode<'_, MySql>>::decode(raw)?),
            Self::Float => float_value(<f32 as Decode<'_, MySql>>::decode(raw)?.to_string()),
            Self::Double => float_value(<f64 as Decode<'_, MySql>>::decode(raw)?.to_string()),
            Self::Date => Value::String(<NaiveDate as Decode<'_, MySql>>::decode(raw)?.to_string()),
            Self::DateTime => {
                Value::String(<NaiveDateTime as Decode<'_, MySql>>::decode(raw)?.to_string())
            }
            Self::Time => Value::String(<MySqlTime as Decode<'_, MySql>>::decode(raw)?.to_string()),
            Self::Json | Self::Binary | Self::Text => {
                self.bytes_value(<&[u8] as Decode<'_, MySql>>::decode(raw)?)
            }
        })
    }

    /// JSON for a value delivered as raw bytes (strings, DECIMAL, JSON, blobs)
    pub fn bytes_value(self, bytes: &[u8]) -> Value {
        if self == Self::Binary {
            return blob(bytes);
        }
        let Ok(text) = std::str::from_utf8(bytes) else {
            return blob(bytes);
        };
        if self == Self::Json {
            if let Ok(value) = serde_json::from_str(text) {
                return value;
            }
        }
        Value::String(text.to_string())
    }
}

/// Parse a float's shortest decimal form, so FLOAT 1.1 reads as 1.1
fn float_value(text: String) -> Value {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

fn blob(bytes: &[u8]) -> Value {
    Value::String(format!("<blob {} bytes>", bytes.len()))
}

//! Read-only query execution
//!
//! MySQL has no per-statement read-only switch, so a caller's SQL runs
//! inside a transaction opened after `SET SESSION TRANSACTION READ ONLY`,
//! and that transaction is always rolled back. The engine rejects most
//! writes; the rollback discards whatever it lets through.
//!
//! A `COMMIT` chained in front of a write would end the read-only
//! transaction early, so input holding more than one statement is refused
//! before a connection is taken. The driver adds a second check by
//! preparing the caller's SQL, which MySQL allows for one statement only.
//!
//! Order within one call: acquire → set mode → begin → execute → rollback →
//! release. [`ReadOnlyScope`] owns the last two steps.

use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError};

use crate::db::{Connection, Database, DbError, Row};

pub const SET_READ_ONLY_SQL: &str = "SET SESSION TRANSACTION READ ONLY";
pub const BEGIN_SQL: &str = "START TRANSACTION";
pub const ROLLBACK_SQL: &str = "ROLLBACK";

/// Run `sql` read-only on a dedicated connection and return its rows
///
/// The first failure among set mode/begin/execute is returned after the
/// rollback and release have run. If those succeed but the rollback fails,
/// the rollback error is returned and the connection is closed rather than
/// pooled.
pub async fn run_read_only(db: &dyn Database, sql: &str) -> Result<Vec<Row>, DbError> {
    ensure_single_statement(sql)?;

    let mut scope = ReadOnlyScope::open(db).await?;
    let outcome = scope.run(sql).await;
    let cleanup = scope.finish().await;

    match (outcome, cleanup) {
        (Ok(rows), Ok(())) => Ok(rows),
        (Ok(_), Err(rollback_err)) => Err(rollback_err),
        (Err(err), cleanup) => {
            if let Err(rollback_err) = cleanup {
                tracing::warn!("Rollback after failed query also failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Number of `;`-separated statements in `sql`
///
/// Quotes, backticks and comments are tokenized as MySQL reads them, so a
/// `;` inside them does not split. Empty statements are not counted.
pub fn statement_count(sql: &str) -> Result<usize, TokenizerError> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql).tokenize()?;

    let mut count = 0;
    let mut in_statement = false;
    for token in tokens {
        match token {
            Token::SemiColon => in_statement = false,
            Token::Whitespace(_) | Token::EOF => {}
            _ if !in_statement => {
                count += 1;
                in_statement = true;
            }
            _ => {}
        }
    }
    Ok(count)
}

fn ensure_single_statement(sql: &str) -> Result<(), DbError> {
    match statement_count(sql) {
        Ok(count) if count > 1 => {
            tracing::warn!("Refusing query with {} statements", count);
            Err(DbError::MultipleStatements(count))
        }
        Ok(_) => Ok(()),
        Err(e) => {
            // The server reports malformed SQL itself; one statement per
            // prepare still holds.
            tracing::debug!("Could not tokenize query: {}", e);
            Ok(())
        }
    }
}

/// A pooled connection that must be rolled back and released on every exit path
///
/// [`finish`](Self::finish) is the normal exit. If the scope is dropped
/// without it (the request future was cancelled mid-query, or a panic
/// unwound through it) the connection is handed to a background task that
/// rolls back and releases it.
pub struct ReadOnlyScope {
    conn: Option<Box<dyn Connection>>,
}

impl ReadOnlyScope {
    pub async fn open(db: &dyn Database) -> Result<Self, DbError> {
        let conn = db.acquire().await?;
        tracing::debug!("Acquired connection");
        Ok(Self { conn: Some(conn) })
    }

    /// Set read-only mode, begin, and execute `sql`
    pub async fn run(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let conn = self.conn_mut()?;
        conn.execute(SET_READ_ONLY_SQL).await?;
        conn.execute(BEGIN_SQL).await?;
        tracing::debug!(sql, "Executing read-only query");
        conn.fetch_all(sql).await
    }

    /// Roll back and release the connection
    pub async fn finish(mut self) -> Result<(), DbError> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        rollback_and_release(conn).await
    }

    fn conn_mut(&mut self) -> Result<&mut Box<dyn Connection>, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::Rejected("connection already released".to_string()))
    }
}

impl Drop for ReadOnlyScope {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        tracing::warn!("Query scope dropped before completion; rolling back in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = rollback_and_release(conn).await {
                        tracing::warn!("Background rollback failed: {}", e);
                    }
                });
            }
            Err(_) => conn.discard(),
        }
    }
}

async fn rollback_and_release(mut conn: Box<dyn Connection>) -> Result<(), DbError> {
    match conn.execute(ROLLBACK_SQL).await {
        Ok(()) => {
            conn.release();
            tracing::debug!("Rolled back and released connection");
            Ok(())
        }
        Err(e) => {
            conn.discard();
            Err(e)
        }
    }
}

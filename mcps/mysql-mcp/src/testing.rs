//! In-memory stand-in for the MySQL pool
//!
//! Understands just enough SQL for the tests (`SELECT 1`, `SELECT * FROM t`,
//! `SELECT COUNT(*) FROM t`, `DELETE FROM t`, transaction control and the
//! session access mode), keeps a snapshot per open transaction, and enforces
//! session read-only mode the way MySQL does. Session state survives a
//! release and is handed to the next acquire, like a pooled connection.
//!
//! `fetch_all` behaves like a prepared statement and refuses `;`-chained
//! input unless [`FakeDatabase::with_multi_statements`] is set, in which case
//! each statement runs in turn. Every pool interaction is recorded as an
//! [`Event`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::db::{Connection, Database, DbError, Row};
use crate::types::ColumnDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Acquire,
    Execute(String),
    Fetch(String),
    Release,
    Discard,
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
}

type Tables = BTreeMap<String, Table>;

/// Per-connection state that outlives a single checkout
#[derive(Debug, Clone, Copy, Default)]
struct Session {
    read_only: bool,
}

#[derive(Default)]
struct Counters {
    in_use: AtomicUsize,
    max_in_use: AtomicUsize,
    catalog_queries: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeDatabase {
    committed: Arc<Mutex<Tables>>,
    events: Arc<Mutex<Vec<Event>>>,
    counters: Arc<Counters>,
    permits: Arc<Semaphore>,
    idle_sessions: Arc<Mutex<Vec<Session>>>,
    multi_statements: bool,
    fail_on: Option<String>,
    enforce_read_only: bool,
    unavailable: bool,
    fetch_delay: Option<Duration>,
}

fn row(fields: &[(&str, Value)]) -> Row {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

impl FakeDatabase {
    /// `users` (3 rows), `orders` (2 rows) and a column-less `audit_stub`
    pub fn shop() -> Self {
        let mut tables = Tables::new();
        tables.insert(
            "users".to_string(),
            Table {
                columns: vec![
                    ColumnDescriptor::new("id", "int"),
                    ColumnDescriptor::new("name", "varchar"),
                    ColumnDescriptor::new("email", "varchar"),
                ],
                rows: vec![
                    row(&[("id", json!(1)), ("name", json!("ada")), ("email", json!("ada@example.com"))]),
                    row(&[("id", json!(2)), ("name", json!("grace")), ("email", json!("grace@example.com"))]),
                    row(&[("id", json!(3)), ("name", json!("linus")), ("email", Value::Null)]),
                ],
            },
        );
        tables.insert(
            "orders".to_string(),
            Table {
                columns: vec![
                    ColumnDescriptor::new("id", "int"),
                    ColumnDescriptor::new("user_id", "int"),
                    ColumnDescriptor::new("total", "decimal"),
                ],
                rows: vec![
                    row(&[("id", json!(10)), ("user_id", json!(1)), ("total", json!("19.99"))]),
                    row(&[("id", json!(11)), ("user_id", json!(2)), ("total", json!("5.00"))]),
                ],
            },
        );
        tables.insert("audit_stub".to_string(), Table::default());

        Self {
            committed: Arc::new(Mutex::new(tables)),
            events: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
            permits: Arc::new(Semaphore::new(10)),
            idle_sessions: Arc::new(Mutex::new(Vec::new())),
            multi_statements: false,
            fail_on: None,
            enforce_read_only: true,
            unavailable: false,
            fetch_delay: None,
        }
    }

    pub fn with_table(self, name: &str) -> Self {
        self.committed
            .lock()
            .unwrap()
            .insert(name.to_string(), Table::default());
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(size));
        self
    }

    /// Any statement equal to `sql` fails
    pub fn failing_on(mut self, sql: &str) -> Self {
        self.fail_on = Some(sql.to_string());
        self
    }

    /// Every acquire and catalog lookup fails
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Run `;`-chained input statement by statement, as the text protocol does
    pub fn with_multi_statements(mut self) -> Self {
        self.multi_statements = true;
        self
    }

    /// Writes go through even in read-only mode, leaving only the rollback
    pub fn without_read_only_enforcement(mut self) -> Self {
        self.enforce_read_only = false;
        self
    }

    /// Hold each fetched statement open this long before returning
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn acquire_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == Event::Acquire)
            .count()
    }

    pub fn connections_in_use(&self) -> usize {
        self.counters.in_use.load(Ordering::SeqCst)
    }

    pub fn max_connections_in_use(&self) -> usize {
        self.counters.max_in_use.load(Ordering::SeqCst)
    }

    pub fn catalog_queries(&self) -> usize {
        self.counters.catalog_queries.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.committed
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Wait for background cleanup to return every connection
    pub async fn wait_until_idle(&self) {
        for _ in 0..1000 {
            if self.connections_in_use() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("connections still in use: {}", self.connections_in_use());
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn check_failure(&self, sql: &str) -> Result<(), DbError> {
        if self.fail_on.as_deref() == Some(sql) {
            return Err(DbError::Rejected(format!("simulated failure on `{}`", sql)));
        }
        Ok(())
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable {
            return Err(DbError::Rejected(
                "Can't connect to MySQL server on 'localhost:3306'".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DbError> {
        self.check_available()?;
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DbError::Rejected(e.to_string()))?;

        let in_use = self.counters.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_use.fetch_max(in_use, Ordering::SeqCst);
        self.record(Event::Acquire);

        let session = self.idle_sessions.lock().unwrap().pop().unwrap_or_default();
        Ok(Box::new(FakeConnection {
            db: self.clone(),
            _permit: permit,
            session,
            transaction: None,
        }))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        self.check_available()?;
        self.counters.catalog_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.committed.lock().unwrap().keys().cloned().collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError> {
        self.check_available()?;
        self.counters.catalog_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .committed
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }
}

struct FakeConnection {
    db: FakeDatabase,
    _permit: OwnedSemaphorePermit,
    session: Session,
    transaction: Option<Tables>,
}

impl FakeConnection {
    fn run(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let normalized = sql.trim().trim_end_matches(';').to_string();
        let upper = normalized.to_uppercase();

        if upper == "SET SESSION TRANSACTION READ ONLY" {
            self.session.read_only = true;
            return Ok(Vec::new());
        }
        if upper == "SET SESSION TRANSACTION READ WRITE" {
            self.session.read_only = false;
            return Ok(Vec::new());
        }
        if upper == "START TRANSACTION" {
            self.transaction = Some(self.db.committed.lock().unwrap().clone());
            return Ok(Vec::new());
        }
        if upper == "ROLLBACK" {
            self.transaction = None;
            return Ok(Vec::new());
        }
        if upper == "COMMIT" {
            if let Some(tables) = self.transaction.take() {
                *self.db.committed.lock().unwrap() = tables;
            }
            return Ok(Vec::new());
        }
        if upper == "SELECT 1" {
            return Ok(vec![row(&[("1", json!(1))])]);
        }
        if let Some(table) = upper.strip_prefix("SELECT COUNT(*) FROM ") {
            let count = self.with_table(table, |t| t.rows.len())?;
            return Ok(vec![row(&[("COUNT(*)", json!(count))])]);
        }
        if let Some(table) = upper.strip_prefix("SELECT * FROM ") {
            return self.with_table(table, |t| t.rows.clone());
        }
        if let Some(table) = upper.strip_prefix("DELETE FROM ") {
            if self.session.read_only && self.db.enforce_read_only {
                return Err(DbError::Rejected(
                    "Cannot execute statement in a READ ONLY transaction.".to_string(),
                ));
            }
            self.with_table_mut(table, |t| t.rows.clear())?;
            return Ok(Vec::new());
        }

        Err(DbError::Rejected(format!(
            "You have an error in your SQL syntax near '{}'",
            normalized
        )))
    }

    fn with_table<T>(&self, upper_name: &str, f: impl FnOnce(&Table) -> T) -> Result<T, DbError> {
        let name = upper_name.trim().to_lowercase();
        let committed = self.db.committed.lock().unwrap();
        let tables = self.transaction.as_ref().unwrap_or(&*committed);
        tables
            .get(&name)
            .map(f)
            .ok_or_else(|| DbError::Rejected(format!("Table 'shop.{}' doesn't exist", name)))
    }

    fn with_table_mut(&mut self, upper_name: &str, f: impl FnOnce(&mut Table)) -> Result<(), DbError> {
        let name = upper_name.trim().to_lowercase();
        let mut committed = self.db.committed.lock().unwrap();
        let tables = match self.transaction.as_mut() {
            Some(tables) => tables,
            None => &mut *committed,
        };
        let table = tables
            .get_mut(&name)
            .ok_or_else(|| DbError::Rejected(format!("Table 'shop.{}' doesn't exist", name)))?;
        f(table);
        Ok(())
    }

    fn close(&self, event: Event) {
        self.db.record(event);
        self.db.counters.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.db.record(Event::Execute(sql.to_string()));
        self.db.check_failure(sql)?;
        self.run(sql).map(|_| ())
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.db.record(Event::Fetch(sql.to_string()));
        self.db.check_failure(sql)?;

        let statements: Vec<&str> = sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if statements.len() > 1 && !self.db.multi_statements {
            return Err(DbError::Rejected(format!(
                "You have an error in your SQL syntax near '{}'",
                statements[1]
            )));
        }
        let mut rows = Vec::new();
        for statement in statements {
            rows = self.run(statement)?;
        }
        if let Some(delay) = self.db.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(rows)
    }

    fn release(self: Box<Self>) {
        self.db.idle_sessions.lock().unwrap().push(self.session);
        self.close(Event::Release);
    }

    fn discard(self: Box<Self>) {
        self.close(Event::Discard);
    }
}

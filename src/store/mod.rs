//! Relational store collaborators.
//!
//! The update pipeline reads schema facts through [`SchemaInspector`] and
//! runs lookups and mutations through [`Connection`]. Both are plain traits
//! so hosts can plug in any driver; [`SqliteStore`] is the bundled adapter.
//!
//! # Request scoping
//!
//! - [`SchemaCache`] memoizes inspector answers for one request only
//! - [`AutocommitGuard`] owns the transaction of one request and restores
//!   the connection's autocommit flag on every exit path
//!
//! All methods take `&self`; drivers that need mutable state keep it behind
//! interior mutability, matching how connection handles are shared.

mod cache;
mod guard;
mod sqlite;

pub use cache::SchemaCache;
pub use guard::AutocommitGuard;
pub use sqlite::SqliteStore;

use std::fmt;

use thiserror::Error;

use crate::model::{Attribute, RelationName};
use crate::sql::Dialect;

/// Errors reported by a store while probing, introspecting or executing.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("query failed: {message}\nSQL: {sql}")]
    Query { sql: String, message: String },

    #[error("statement failed: {message}\nSQL: {sql}")]
    Statement { sql: String, message: String },

    #[error("transaction control failed: {0}")]
    Transaction(String),

    #[error("column {0} does not exist")]
    UnknownColumn(String),

    #[error("store cannot open a {0} database")]
    UnsupportedDialect(Dialect),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Identity of a connected database: its configured name and dialect.
///
/// Two handles denote the same database when their names match.
#[derive(Debug, Clone)]
pub struct DatabaseHandle {
    pub name: String,
    pub dialect: Dialect,
}

impl DatabaseHandle {
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            dialect,
        }
    }
}

impl PartialEq for DatabaseHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DatabaseHandle {}

impl fmt::Display for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.dialect)
    }
}

/// A single-column foreign key: `referencing` points at `referenced`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignKey {
    pub referencing: Attribute,
    pub referenced: Attribute,
}

/// Schema facts needed to plan mutations.
pub trait SchemaInspector {
    /// Primary-key columns of `table`, in key order. Empty when keyless.
    fn primary_key_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>>;

    /// Foreign keys declared on `table` (the keys it imports).
    fn foreign_keys(&self, table: &RelationName) -> StoreResult<Vec<ForeignKey>>;

    fn is_nullable(&self, attribute: &Attribute) -> StoreResult<bool>;

    /// Every column of `table`, in declaration order.
    fn list_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>>;
}

/// One result row; `None` cells are SQL NULL.
pub type Row = Vec<Option<String>>;

/// A live connection able to query, execute and control transactions.
pub trait Connection {
    fn database(&self) -> &DatabaseHandle;

    fn dialect(&self) -> Dialect {
        self.database().dialect
    }

    fn query(&self, sql: &str) -> StoreResult<Vec<Row>>;

    /// Execute one statement, returning the affected-row count when the
    /// driver reports one.
    fn execute(&self, sql: &str) -> StoreResult<Option<u64>>;

    fn supports_batch_updates(&self) -> bool;

    /// Whether `rollback` undoes statements run since autocommit was
    /// switched off.
    fn supports_transactions(&self) -> bool {
        true
    }

    fn autocommit(&self) -> bool;

    fn set_autocommit(&self, enabled: bool) -> StoreResult<()>;

    /// Execute statements as one batch. Stops at the first failure.
    fn execute_batch(&self, statements: &[&str]) -> StoreResult<Vec<Option<u64>>> {
        statements.iter().map(|sql| self.execute(sql)).collect()
    }

    fn commit(&self) -> StoreResult<()>;

    fn rollback(&self) -> StoreResult<()>;
}

/// A store that is both inspector and connection.
pub trait Store: SchemaInspector + Connection {
    fn as_inspector(&self) -> &dyn SchemaInspector;
    fn as_connection(&self) -> &dyn Connection;
}

impl<T: SchemaInspector + Connection> Store for T {
    fn as_inspector(&self) -> &dyn SchemaInspector {
        self
    }

    fn as_connection(&self) -> &dyn Connection {
        self
    }
}

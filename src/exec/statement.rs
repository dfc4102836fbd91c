// src/exec/statement.rs
use std::fmt;

use crate::model::{BindingMap, RelationName};
use crate::store::DatabaseHandle;

/// The four kinds of row mutation an update request can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Insert,
    /// Fill in columns that are NULL or already hold the new value.
    UpdateNonNull,
    /// Clear columns that hold the removed value.
    UpdateToNull,
    Delete,
}

impl MutationKind {
    /// Rows the statement must affect for the request to succeed.
    pub fn minimum_rows(self) -> u64 {
        match self {
            MutationKind::Insert | MutationKind::UpdateNonNull => 1,
            MutationKind::UpdateToNull | MutationKind::Delete => 0,
        }
    }

    /// Whether the statement writes new values into referencing columns.
    pub fn writes_values(self) -> bool {
        matches!(self, MutationKind::Insert | MutationKind::UpdateNonNull)
    }

    /// Whether the statement removes values that others may reference.
    pub fn removes_values(self) -> bool {
        matches!(self, MutationKind::UpdateToNull | MutationKind::Delete)
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Insert => "INSERT",
            MutationKind::UpdateNonNull => "UPDATE",
            MutationKind::UpdateToNull => "UPDATE (to NULL)",
            MutationKind::Delete => "DELETE",
        })
    }
}

/// One planned SQL statement with the metadata needed to order and
/// verify it.
///
/// `bindings` are the attribute values the statement writes, or for a
/// DELETE the values that identify the removed row. `subject` holds the
/// primary-key bindings of the affected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationStatement {
    pub kind: MutationKind,
    pub table: RelationName,
    pub database: DatabaseHandle,
    pub bindings: BindingMap,
    pub subject: BindingMap,
    pub sql: String,
    pub minimum_rows: u64,
}

impl MutationStatement {
    pub fn new(
        kind: MutationKind,
        table: RelationName,
        database: DatabaseHandle,
        bindings: BindingMap,
        subject: BindingMap,
        sql: String,
    ) -> Self {
        Self {
            kind,
            table,
            database,
            bindings,
            subject,
            sql,
            minimum_rows: kind.minimum_rows(),
        }
    }
}

impl fmt::Display for MutationStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

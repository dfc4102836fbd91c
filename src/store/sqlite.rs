// src/store/sqlite.rs
use std::cell::Cell;

use rusqlite::types::ValueRef;
use rusqlite::Connection as SqliteConnection;

use super::{Connection, DatabaseHandle, ForeignKey, Row, SchemaInspector, StoreError, StoreResult};
use crate::config::DatabaseSettings;
use crate::model::{Attribute, RelationName};
use crate::sql::{Dialect, SqlDialect};

/// [`Store`](super::Store) backed by an embedded SQLite database.
///
/// Foreign-key enforcement is switched on when the database is opened.
/// With autocommit off, the first statement opens a transaction with
/// `BEGIN`; `commit`/`rollback` close it.
#[derive(Debug)]
pub struct SqliteStore {
    conn: SqliteConnection,
    handle: DatabaseHandle,
    autocommit: Cell<bool>,
    in_transaction: Cell<bool>,
}

struct ColumnInfo {
    name: String,
    not_null: bool,
    pk: i64,
}

impl SqliteStore {
    /// Open the database described by `settings`.
    ///
    /// The settings must name the `sqlite` dialect.
    pub fn open(settings: &DatabaseSettings) -> StoreResult<Self> {
        if settings.dialect != Dialect::Sqlite {
            return Err(StoreError::UnsupportedDialect(settings.dialect));
        }
        let conn = if settings.is_in_memory() {
            SqliteConnection::open_in_memory()?
        } else {
            SqliteConnection::open(&settings.path)?
        };
        Self::from_connection(
            conn,
            DatabaseHandle::new(settings.name.clone(), settings.dialect),
        )
    }

    /// Open a private in-memory database under the given handle name.
    pub fn open_in_memory(name: impl Into<String>) -> StoreResult<Self> {
        Self::from_connection(
            SqliteConnection::open_in_memory()?,
            DatabaseHandle::new(name, Dialect::Sqlite),
        )
    }

    fn from_connection(conn: SqliteConnection, handle: DatabaseHandle) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn,
            handle,
            autocommit: Cell::new(true),
            in_transaction: Cell::new(false),
        })
    }

    /// Underlying rusqlite connection, for schema setup and inspection.
    pub fn connection(&self) -> &SqliteConnection {
        &self.conn
    }

    fn pragma(&self, table: &RelationName, pragma: &str) -> String {
        let quote = |s: &str| Dialect::Sqlite.quote_identifier(s);
        match table.schema() {
            Some(schema) => format!("PRAGMA {}.{}({})", quote(schema), pragma, quote(table.table())),
            None => format!("PRAGMA {}({})", pragma, quote(table.table())),
        }
    }

    fn table_info(&self, table: &RelationName) -> StoreResult<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(&self.pragma(table, "table_info"))?;
        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                not_null: row.get::<_, i64>("notnull")? != 0,
                pk: row.get("pk")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn control(&self, sql: &str) -> StoreResult<()> {
        tracing::debug!(sql, "transaction control");
        self.conn
            .execute_batch(sql)
            .map_err(|e| StoreError::Transaction(format!("{sql}: {e}")))
    }

    fn ensure_transaction(&self) -> StoreResult<()> {
        if !self.autocommit.get() && !self.in_transaction.get() {
            self.control("BEGIN")?;
            self.in_transaction.set(true);
        }
        Ok(())
    }
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

impl SchemaInspector for SqliteStore {
    fn primary_key_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        let mut keyed: Vec<ColumnInfo> = self
            .table_info(table)?
            .into_iter()
            .filter(|c| c.pk > 0)
            .collect();
        keyed.sort_by_key(|c| c.pk);
        Ok(keyed
            .into_iter()
            .map(|c| Attribute::new(table.clone(), c.name))
            .collect())
    }

    fn foreign_keys(&self, table: &RelationName) -> StoreResult<Vec<ForeignKey>> {
        let mut stmt = self.conn.prepare(&self.pragma(table, "foreign_key_list"))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>("table")?,
                row.get::<_, String>("from")?,
                row.get::<_, Option<String>>("to")?,
            ))
        })?;

        let mut keys = Vec::new();
        for row in rows {
            let (target, from, to) = row?;
            let referenced_table = match table.schema() {
                Some(schema) => RelationName::with_schema(schema, target),
                None => RelationName::new(target),
            };
            // A missing target column means the referenced table's key.
            let referenced_column = match to {
                Some(column) => column,
                None => match self.primary_key_columns(&referenced_table)?.into_iter().next() {
                    Some(pk) => pk.column().to_string(),
                    None => continue,
                },
            };
            keys.push(ForeignKey {
                referencing: Attribute::new(table.clone(), from),
                referenced: Attribute::new(referenced_table, referenced_column),
            });
        }
        Ok(keys)
    }

    fn is_nullable(&self, attribute: &Attribute) -> StoreResult<bool> {
        self.table_info(attribute.relation())?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(attribute.column()))
            .map(|c| !c.not_null && c.pk == 0)
            .ok_or_else(|| StoreError::UnknownColumn(attribute.to_string()))
    }

    fn list_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        Ok(self
            .table_info(table)?
            .into_iter()
            .map(|c| Attribute::new(table.clone(), c.name))
            .collect())
    }
}

impl Connection for SqliteStore {
    fn database(&self) -> &DatabaseHandle {
        &self.handle
    }

    fn query(&self, sql: &str) -> StoreResult<Vec<Row>> {
        let fail = |e: rusqlite::Error| StoreError::Query {
            sql: sql.to_string(),
            message: e.to_string(),
        };
        let mut stmt = self.conn.prepare(sql).map_err(fail)?;
        let width = stmt.column_count();
        let mut rows = stmt.query([]).map_err(fail)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(fail)? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(cell_text(row.get_ref(i).map_err(fail)?));
            }
            out.push(cells);
        }
        Ok(out)
    }

    fn execute(&self, sql: &str) -> StoreResult<Option<u64>> {
        self.ensure_transaction()?;
        let affected = self.conn.execute(sql, []).map_err(|e| StoreError::Statement {
            sql: sql.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(affected as u64))
    }

    fn supports_batch_updates(&self) -> bool {
        true
    }

    fn autocommit(&self) -> bool {
        self.autocommit.get()
    }

    fn set_autocommit(&self, enabled: bool) -> StoreResult<()> {
        if enabled && self.in_transaction.get() {
            self.commit()?;
        }
        self.autocommit.set(enabled);
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        if self.in_transaction.replace(false) {
            self.control("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        if self.in_transaction.replace(false) {
            self.control("ROLLBACK")?;
        }
        Ok(())
    }
}

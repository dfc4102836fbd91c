//! SQL Dialect definitions and formatting rules.
//!
//! Statement rendering only varies across engines in a handful of places,
//! and each dialect implements `SqlDialect` to cover them:
//!
//! - Identifier quoting: `"` (SQLite/PG/DuckDB), `` ` `` (MySQL), `[]` (T-SQL)
//! - String literals: `'...'` vs T-SQL `N'...'` for non-ASCII text
//! - Typed date/timestamp literals
//! - Lookup row limits: `LIMIT n` vs `TOP n`
//!
//! # Usage
//!
//! ```ignore
//! use triplewrite::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("people");  // "people"
//! ```

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use serde::Deserialize;

use super::token::TokenStream;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, schema).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    /// Override for Unicode prefix (T-SQL N'...').
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Date/Time
    // =========================================================================

    fn format_date_literal(&self, date: &str) -> String {
        format!("DATE '{}'", date)
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        format!("TIMESTAMP '{}'", timestamp)
    }

    // =========================================================================
    // Row Limits
    // =========================================================================

    /// Tokens placed directly after `SELECT` to cap the result set.
    fn emit_limit_prefix(&self, limit: u64) -> Option<TokenStream> {
        let _ = limit;
        None
    }

    /// Tokens appended after the WHERE clause to cap the result set.
    fn emit_limit_suffix(&self, limit: u64) -> Option<TokenStream> {
        Some(helpers::emit_limit_suffix(limit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    MySql,
    TSql,
    DuckDb,
}

impl Dialect {
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.dialect().format_date_literal(date)
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        self.dialect().format_timestamp_literal(timestamp)
    }

    fn emit_limit_prefix(&self, limit: u64) -> Option<TokenStream> {
        self.dialect().emit_limit_prefix(limit)
    }

    fn emit_limit_suffix(&self, limit: u64) -> Option<TokenStream> {
        self.dialect().emit_limit_suffix(limit)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

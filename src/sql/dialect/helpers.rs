//! Shared helper functions for SQL dialect implementations.
//!
//! Dialects compose these to implement `SqlDialect` without duplicating
//! quoting and row-limit rules.

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: SQLite, Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Row Limits
// =============================================================================

/// `LIMIT n` suffix.
/// Used by: SQLite, Postgres, DuckDB, MySQL
pub fn emit_limit_suffix(limit: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Limit)
        .space()
        .push(Token::LitInt(limit as i64));
    ts
}

/// `TOP n` prefix placed right after SELECT.
/// Used by: T-SQL
pub fn emit_top_prefix(limit: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Top).space().push(Token::LitInt(limit as i64));
    ts
}

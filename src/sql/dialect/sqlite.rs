//! SQLite dialect.
//!
//! SQLite accepts ANSI double-quoted identifiers and stores dates as text,
//! so typed `DATE '...'` literals are rendered as plain strings.

use super::helpers;
use super::SqlDialect;

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_date_literal(&self, date: &str) -> String {
        helpers::quote_string_single(date)
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        helpers::quote_string_single(timestamp)
    }
}

//! PostgreSQL dialect.
//!
//! ANSI identifier quoting (`"`), typed `DATE '...'` and `TIMESTAMP '...'`
//! literals, `LIMIT n` for row lookups.

use super::helpers;
use super::SqlDialect;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    // Uses default typed date literals and LIMIT suffix
}

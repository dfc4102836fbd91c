//! MySQL dialect.
//!
//! MySQL differences from ANSI that matter here:
//! - Backtick identifier quoting (`` `name` ``)
//! - `LIMIT n` for row lookups

use super::helpers;
use super::SqlDialect;

/// MySQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }
}

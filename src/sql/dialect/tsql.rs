//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differences from ANSI that matter here:
//! - Square bracket identifier quoting (`[name]`)
//! - N'...' prefix for Unicode strings
//! - No `DATE '...'` typed literal syntax
//! - TOP instead of LIMIT

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // Always use the N prefix for non-ASCII text
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_date_literal(&self, date: &str) -> String {
        helpers::quote_string_single(date)
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        helpers::quote_string_single(timestamp)
    }

    fn emit_limit_prefix(&self, limit: u64) -> Option<TokenStream> {
        Some(helpers::emit_top_prefix(limit))
    }

    fn emit_limit_suffix(&self, _limit: u64) -> Option<TokenStream> {
        None
    }
}

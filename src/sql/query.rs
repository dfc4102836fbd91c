//! SELECT builder for planning lookups.
//!
//! Lookups are single-table reads: a column list (or `*`), a WHERE
//! conjunction and an optional row limit rendered in the dialect's form.

use super::dialect::{Dialect, SqlDialect};
use super::expr::{BinaryOperator, Expr};
use super::token::{Token, TokenStream};

/// Single-table SELECT.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct Select {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<Expr>,
    pub filter: Option<Expr>,
    pub limit: Option<u64>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            columns: Vec::new(),
            filter: None,
            limit: None,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = Expr>) -> Self {
        self.columns = cols.into_iter().collect();
        self
    }

    /// Add WHERE clause; repeated calls AND the conditions.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::BinaryOp {
                left: Box::new(existing),
                op: BinaryOperator::And,
                right: Box::new(expr),
            },
            None => expr,
        });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        if let Some(prefix) = self.limit.and_then(|n| dialect.emit_limit_prefix(n)) {
            ts.append(&prefix).space();
        }

        if self.columns.is_empty() {
            ts.push(Token::Star);
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&col.to_tokens());
            }
        }

        ts.space().push(Token::From).space();
        ts.push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.table.clone(),
        });

        if let Some(ref filter) = self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens());
        }

        if let Some(suffix) = self.limit.and_then(|n| dialect.emit_limit_suffix(n)) {
            ts.space().append(&suffix);
        }

        ts
    }
}

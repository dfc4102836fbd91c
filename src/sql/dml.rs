//! DML (Data Manipulation Language) builders.
//!
//! INSERT, UPDATE and DELETE statements rendered through the token stream,
//! so identifier quoting follows the target dialect.
//!
//! # Examples
//!
//! ```ignore
//! use triplewrite::sql::dml::{Insert, Update, Delete};
//! use triplewrite::sql::expr::{table_col, lit_str, lit_int, ExprExt};
//!
//! let insert = Insert::into("people")
//!     .columns(["id", "name"])
//!     .values([lit_int(7), lit_str("Alice")]);
//!
//! let update = Update::table("people")
//!     .set("name", lit_str("Bob"))
//!     .filter(table_col("people", "id").eq(lit_int(7)));
//!
//! let delete = Delete::from("people")
//!     .filter(table_col("people", "id").eq(lit_int(7)));
//! ```

use super::dialect::Dialect;
use super::expr::{BinaryOperator, Expr};
use super::token::{Token, TokenStream};

fn table_token(schema: &Option<String>, table: &str) -> Token {
    match schema {
        Some(schema) => Token::QualifiedIdent {
            schema: Some(schema.clone()),
            name: table.to_string(),
        },
        None => Token::Ident(table.to_string()),
    }
}

fn and_filter(existing: Option<Expr>, expr: Expr) -> Expr {
    match existing {
        Some(existing) => Expr::BinaryOp {
            left: Box::new(existing),
            op: BinaryOperator::And,
            right: Box::new(expr),
        },
        None => expr,
    }
}

// ============================================================================
// INSERT
// ============================================================================

/// INSERT statement.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the columns to insert.
    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Set the row of values.
    pub fn values(mut self, vals: impl IntoIterator<Item = impl Into<Expr>>) -> Self {
        self.values = vals.into_iter().map(|v| v.into()).collect();
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Insert).space().push(Token::Into).space();
        ts.push(table_token(&self.schema, &self.table));

        if !self.columns.is_empty() {
            ts.space().lparen();
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.push(Token::Ident(col.clone()));
            }
            ts.rparen();
        }

        ts.space().push(Token::Values).space().lparen();
        for (i, val) in self.values.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&val.to_tokens());
        }
        ts.rparen();

        ts
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Update {
    pub schema: Option<String>,
    pub table: String,
    pub set: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

impl Update {
    /// Create a new UPDATE statement.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            set: Vec::new(),
            filter: None,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set a column to a value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.set.push((column.into(), value.into()));
        self
    }

    /// Add WHERE clause; repeated calls AND the conditions.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(and_filter(self.filter.take(), expr));
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Update).space();
        ts.push(table_token(&self.schema, &self.table));

        ts.space().push(Token::Set).space();
        for (i, (col, expr)) in self.set.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone()))
                .space()
                .push(Token::Eq)
                .space()
                .append(&expr.to_tokens());
        }

        if let Some(ref filter) = self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens());
        }

        ts
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Delete {
    pub schema: Option<String>,
    pub table: String,
    pub filter: Option<Expr>,
}

impl Delete {
    /// Create a new DELETE statement.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            filter: None,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add WHERE clause; repeated calls AND the conditions.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(and_filter(self.filter.take(), expr));
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Delete).space().push(Token::From).space();
        ts.push(table_token(&self.schema, &self.table));

        if let Some(ref filter) = self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens());
        }

        ts
    }
}
